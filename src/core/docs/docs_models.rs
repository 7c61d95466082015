// Wire-compatible models for the Drive and Docs APIs.
// Only the fields this tool reads or writes are modelled; serde ignores the rest.
// refer to https://developers.google.com/docs/api/reference/rest/v1/documents

use serde::{Deserialize, Serialize};

// ============================================================================
// EDIT OPERATIONS
// ============================================================================

/// A position in the document body. Docs indices are UTF-16 offsets
/// starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: i64,
}

impl Location {
    pub fn at(index: i64) -> Self {
        Self { index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextRequest {
    pub location: Location,
    pub text: String,
}

/// A cell inside the table that begins at `table_start_location`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    pub table_start_location: Location,
    pub row_index: i64,
    pub column_index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTableRowRequest {
    pub table_cell_location: TableCellLocation,
    pub insert_below: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    pub text: String,
    #[serde(default)]
    pub match_case: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAllTextRequest {
    pub contains_text: SubstringMatchCriteria,
    pub replace_text: String,
}

/// One entry of a batch update. Serializes to the API's `Request` object,
/// e.g. `{"insertText": {"location": {"index": 1}, "text": "hi"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditOperation {
    InsertText(InsertTextRequest),
    InsertTableRow(InsertTableRowRequest),
    ReplaceAllText(ReplaceAllTextRequest),
}

impl EditOperation {
    pub fn insert_text(index: i64, text: impl Into<String>) -> Self {
        Self::InsertText(InsertTextRequest {
            location: Location::at(index),
            text: text.into(),
        })
    }

    /// Adds a row below `row` of the table whose first index is `table_start`.
    pub fn insert_table_row_below(table_start: i64, row: i64, column: i64) -> Self {
        Self::InsertTableRow(InsertTableRowRequest {
            table_cell_location: TableCellLocation {
                table_start_location: Location::at(table_start),
                row_index: row,
                column_index: column,
            },
            insert_below: true,
        })
    }

    /// Case-insensitive replace of every occurrence of `find`.
    pub fn replace_all(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self::ReplaceAllText(ReplaceAllTextRequest {
            contains_text: SubstringMatchCriteria {
                text: find.into(),
                match_case: false,
            },
            replace_text: replace.into(),
        })
    }

    /// The fixed document offset this operation targets, if any.
    /// Replacements match by content and have none.
    pub fn target_index(&self) -> Option<i64> {
        match self {
            Self::InsertText(req) => Some(req.location.index),
            Self::InsertTableRow(req) => Some(req.table_cell_location.table_start_location.index),
            Self::ReplaceAllText(_) => None,
        }
    }

    /// The API's name for this request kind, as it appears in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsertText(_) => "insertText",
            Self::InsertTableRow(_) => "insertTableRow",
            Self::ReplaceAllText(_) => "replaceAllText",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateRequest<'a> {
    pub requests: &'a [EditOperation],
}

/// Result of `documents.batchUpdate`: one reply per request, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    pub document_id: String,
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_control: Option<serde_json::Value>,
}

impl BatchUpdateResponse {
    /// Total number of replaced occurrences across all `replaceAllText` replies.
    pub fn occurrences_changed(&self) -> u64 {
        self.replies
            .iter()
            .filter_map(|reply| reply["replaceAllText"]["occurrencesChanged"].as_u64())
            .sum()
    }
}

// ============================================================================
// EDIT PLAN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub find: String,
    pub replace: String,
}

/// Parameters of the batch this tool applies to the copied document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    pub insert_index: i64,
    pub insert_text: String,
    /// First index of the table that receives a new row.
    pub table_index: i64,
    pub replacements: Vec<Replacement>,
}

impl Default for EditPlan {
    fn default() -> Self {
        Self {
            insert_index: 178,
            insert_text: "\nHello.".to_string(),
            table_index: 82,
            replacements: vec![
                Replacement {
                    find: "{{insert2}}".to_string(),
                    replace: "lazy dog".to_string(),
                },
                Replacement {
                    find: "{{insert1}}".to_string(),
                    replace: "The Quick Brown fox.".to_string(),
                },
            ],
        }
    }
}

// ============================================================================
// DRIVE / DOCS RESOURCES
// ============================================================================

/// refer to https://developers.google.com/drive/api/reference/rest/v3/files#File
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CopyFileRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    pub body: Option<Body>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// A typed node of the content tree. The API leaves `startIndex` out for the
/// very first element, so it is optional here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    pub start_index: Option<i64>,
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edit_operations_match_request_wire_shape() {
        let ops = [
            EditOperation::insert_text(178, "\nHello."),
            EditOperation::insert_table_row_below(82, 0, 0),
            EditOperation::replace_all("{{insert2}}", "lazy dog"),
        ];
        let body = serde_json::to_value(BatchUpdateRequest { requests: &ops }).unwrap();

        assert_eq!(
            body,
            json!({
                "requests": [
                    {"insertText": {"location": {"index": 178}, "text": "\nHello."}},
                    {"insertTableRow": {
                        "tableCellLocation": {
                            "tableStartLocation": {"index": 82},
                            "rowIndex": 0,
                            "columnIndex": 0
                        },
                        "insertBelow": true
                    }},
                    {"replaceAllText": {
                        "containsText": {"text": "{{insert2}}", "matchCase": false},
                        "replaceText": "lazy dog"
                    }}
                ]
            })
        );
    }

    #[test]
    fn test_target_index() {
        assert_eq!(EditOperation::insert_text(5, "x").target_index(), Some(5));
        assert_eq!(
            EditOperation::insert_table_row_below(9, 0, 0).target_index(),
            Some(9)
        );
        assert_eq!(EditOperation::replace_all("a", "b").target_index(), None);
    }

    #[test]
    fn test_batch_response_counts_replacements() {
        let response: BatchUpdateResponse = serde_json::from_value(json!({
            "documentId": "doc",
            "replies": [
                {},
                {},
                {"replaceAllText": {"occurrencesChanged": 2}},
                {"replaceAllText": {}},
            ],
            "writeControl": {"requiredRevisionId": "rev"}
        }))
        .unwrap();

        assert_eq!(response.replies.len(), 4);
        assert_eq!(response.occurrences_changed(), 2);
    }

    #[test]
    fn test_document_without_first_start_index() {
        let doc: Document = serde_json::from_value(json!({
            "documentId": "doc",
            "title": "try-gdocs-api",
            "body": {"content": [
                {"endIndex": 1, "sectionBreak": {}},
                {"startIndex": 1, "endIndex": 7, "paragraph": {"elements": [
                    {"startIndex": 1, "textRun": {"content": "Hello\n"}}
                ]}}
            ]}
        }))
        .unwrap();

        let content = &doc.body.unwrap().content;
        assert_eq!(content[0].start_index, None);
        assert!(content[0].paragraph.is_none());
        assert_eq!(content[1].start_index, Some(1));
    }
}
