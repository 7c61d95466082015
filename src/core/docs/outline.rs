// Read-only walk over a fetched document, used to find the offsets an edit
// plan should target (where tables start, what text sits where).

use super::docs_models::{Document, StructuralElement};

/// One top-level body element worth showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineEntry {
    Table {
        element: usize,
        start_index: i64,
        rows: usize,
        cells: Vec<Vec<String>>,
    },
    Paragraph {
        element: usize,
        start_index: i64,
        runs: Vec<String>,
    },
}

/// Lists every top-level table and paragraph in body order.
pub fn document_outline(doc: &Document) -> Vec<OutlineEntry> {
    let Some(body) = &doc.body else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (element, se) in body.content.iter().enumerate() {
        let start_index = se.start_index.unwrap_or(0);

        if let Some(table) = &se.table {
            let cells: Vec<Vec<String>> = table
                .table_rows
                .iter()
                .map(|row| {
                    row.table_cells
                        .iter()
                        .map(|cell| {
                            let mut text = String::new();
                            for inner in &cell.content {
                                collect_text(inner, &mut text);
                            }
                            text.trim().to_string()
                        })
                        .collect()
                })
                .collect();

            entries.push(OutlineEntry::Table {
                element,
                start_index,
                rows: table.table_rows.len(),
                cells,
            });
        }

        if let Some(paragraph) = &se.paragraph {
            let runs = paragraph
                .elements
                .iter()
                .filter_map(|e| e.text_run.as_ref())
                .filter_map(|run| run.content.clone())
                .collect();

            entries.push(OutlineEntry::Paragraph {
                element,
                start_index,
                runs,
            });
        }
    }

    entries
}

fn collect_text(element: &StructuralElement, output: &mut String) {
    if let Some(paragraph) = &element.paragraph {
        for run in paragraph.elements.iter().filter_map(|e| e.text_run.as_ref()) {
            if let Some(content) = &run.content {
                output.push_str(content);
            }
        }
    }
}

/// Human-readable form of [`document_outline`].
pub fn render_outline(doc: &Document) -> String {
    let mut out = format!("The title of the doc is: {}\n", doc.title);

    for entry in document_outline(doc) {
        match entry {
            OutlineEntry::Table {
                element,
                start_index,
                rows,
                cells,
            } => {
                out.push_str(&format!("Table start index: {} ({} rows)\n", start_index, rows));
                for row in cells {
                    out.push_str(&format!("| {} |\n", row.join(" | ")));
                }
                out.push_str(&format!("Element: {}\n-------\n", element));
            }
            OutlineEntry::Paragraph {
                element,
                start_index,
                runs,
            } => {
                let text = runs.concat();
                out.push_str(&format!("Paragraph start index: {}\n", start_index));
                out.push_str(&text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&format!("Element: {}\n-------\n", element));
            }
        }
    }

    out
}
