use docx_core::document::{
    Alignment,
    HeaderFooterKind,
    HeaderFooterType,
    Orientation,
    PageSize,
    SectionStart,
};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;

use super::documents::DocumentIdParams;
use crate::{DocxMcp, helpers};

/// Parameters for addressing one section.
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SectionIndexParams {
    pub document_id: String,
    #[serde(default)]
    pub section_index: usize,
}

/// Parameters for setting page margins, in inches. Absent values are unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MarginsParams {
    pub document_id: String,
    #[serde(default)]
    pub section_index: usize,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

/// Parameters for changing page orientation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OrientationParams {
    pub document_id: String,
    #[serde(default)]
    pub section_index: usize,
    /// portrait or landscape.
    pub orientation: String,
}

/// Parameters for changing page size.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageSizeParams {
    pub document_id: String,
    #[serde(default)]
    pub section_index: usize,
    /// letter, a4, legal or a3.
    pub size: String,
}

/// Parameters for adding a section.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddSectionParams {
    pub document_id: String,
    /// continuous, next_page (default), even_page, odd_page or next_column.
    pub start: Option<String>,
}

/// Parameters for setting header or footer text.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HeaderFooterTextParams {
    pub document_id: String,
    #[serde(default)]
    pub section_index: usize,
    pub text: String,
    /// default, first or even.
    pub header_type: Option<String>,
}

/// Parameters for reading headers and footers.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetHeaderFooterParams {
    pub document_id: String,
    #[serde(default)]
    pub section_index: usize,
    /// header or footer.
    pub kind: String,
    pub header_type: Option<String>,
}

/// Parameters for adding page numbers.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageNumbersParams {
    pub document_id: String,
    #[serde(default)]
    pub section_index: usize,
    /// left, center (default) or right.
    pub alignment: Option<String>,
    /// header or footer (default).
    pub position: Option<String>,
}

fn header_type(value: Option<&str>) -> Result<HeaderFooterType, ErrorData> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(HeaderFooterType::Default),
        Some(value) => HeaderFooterType::from_xml(&value.to_ascii_lowercase()).ok_or_else(|| {
            helpers::invalid_params(format!(
                "Invalid header type: {value}. Use default, first or even"
            ))
        }),
    }
}

fn header_kind(value: &str) -> Result<HeaderFooterKind, ErrorData> {
    match value.trim().to_ascii_lowercase().as_str() {
        "header" => Ok(HeaderFooterKind::Header),
        "footer" => Ok(HeaderFooterKind::Footer),
        _ => Err(helpers::invalid_params(format!(
            "Invalid position: {value}. Use header or footer"
        ))),
    }
}

#[tool_router(router = tool_router_layout, vis = "pub")]
impl<C: Connection> DocxMcp<C> {
    #[tool(description = "List sections with page size, orientation and margins (inches).")]
    async fn list_sections(
        &self,
        Parameters(params): Parameters<DocumentIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let sections = self.read(&params.document_id, |doc| Ok(doc.sections())).await?;
        helpers::json_result(sections)
    }

    #[tool(description = "Set page margins in inches for a section.")]
    async fn set_margins(
        &self,
        Parameters(params): Parameters<MarginsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let section = self
            .edit(&params.document_id, |doc| {
                doc.set_margins(params.section_index, params.top, params.bottom, params.left, params.right)
            })
            .await?;
        helpers::json_result(section)
    }

    #[tool(description = "Set a section to portrait or landscape, swapping page dimensions.")]
    async fn set_orientation(
        &self,
        Parameters(params): Parameters<OrientationParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let orientation = helpers::parse::<Orientation>(&params.orientation)?;
        let section = self
            .edit(&params.document_id, |doc| {
                doc.set_orientation(params.section_index, orientation)
            })
            .await?;
        helpers::json_result(section)
    }

    #[tool(description = "Set a section's paper size (letter, a4, legal, a3), keeping its orientation.")]
    async fn set_page_size(
        &self,
        Parameters(params): Parameters<PageSizeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let size = helpers::parse::<PageSize>(&params.size)?;
        let section = self
            .edit(&params.document_id, |doc| doc.set_page_size(params.section_index, size))
            .await?;
        helpers::json_result(section)
    }

    #[tool(description = "Start a new section at the end of the document. Returns the section index.")]
    async fn add_section(
        &self,
        Parameters(params): Parameters<AddSectionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let start = helpers::parse_opt::<SectionStart>(params.start.as_deref())?
            .unwrap_or(SectionStart::NextPage);
        let index = self
            .edit(&params.document_id, |doc| Ok(doc.add_section(start)))
            .await?;
        helpers::json_result(json!({ "section_index": index }))
    }

    #[tool(description = "Replace a section's header text.")]
    async fn set_header(
        &self,
        Parameters(params): Parameters<HeaderFooterTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let header_type = header_type(params.header_type.as_deref())?;
        let header = self
            .edit(&params.document_id, |doc| {
                doc.set_header(params.section_index, &params.text, header_type)?;
                doc.header_footer_info(params.section_index, HeaderFooterKind::Header, header_type)
            })
            .await?;
        helpers::json_result(header)
    }

    #[tool(description = "Replace a section's footer text.")]
    async fn set_footer(
        &self,
        Parameters(params): Parameters<HeaderFooterTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let header_type = header_type(params.header_type.as_deref())?;
        let footer = self
            .edit(&params.document_id, |doc| {
                doc.set_footer(params.section_index, &params.text, header_type)?;
                doc.header_footer_info(params.section_index, HeaderFooterKind::Footer, header_type)
            })
            .await?;
        helpers::json_result(footer)
    }

    #[tool(description = "Read a section's header or footer, including one inherited from an earlier section.")]
    async fn get_header_footer(
        &self,
        Parameters(params): Parameters<GetHeaderFooterParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let kind = header_kind(&params.kind)?;
        let header_type = header_type(params.header_type.as_deref())?;
        let info = self
            .read(&params.document_id, |doc| {
                doc.header_footer_info(params.section_index, kind, header_type)
            })
            .await?;
        helpers::json_result(info)
    }

    #[tool(description = "Write 'Page N' with a page-number field into a section's header or footer.")]
    async fn add_page_numbers(
        &self,
        Parameters(params): Parameters<PageNumbersParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let alignment = helpers::parse_opt::<Alignment>(params.alignment.as_deref())?
            .unwrap_or(Alignment::Center);
        let position = params
            .position
            .as_deref()
            .map(header_kind)
            .transpose()?
            .unwrap_or(HeaderFooterKind::Footer);
        self.edit(&params.document_id, |doc| {
            doc.add_page_numbers(params.section_index, alignment, position)
        })
        .await?;
        helpers::json_result(json!({
            "section_index": params.section_index,
            "position": position,
            "alignment": alignment,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_parameters_parse() {
        assert_eq!(header_type(None).unwrap(), HeaderFooterType::Default);
        assert_eq!(header_type(Some("First")).unwrap(), HeaderFooterType::First);
        assert!(header_type(Some("odd")).is_err());
        assert_eq!(header_kind(" footer ").unwrap(), HeaderFooterKind::Footer);
    }
}
