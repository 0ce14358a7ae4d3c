use crate::error::{AdapterError, Result};

/// Extract the text layer of a PDF. Parsing is CPU-bound, so it runs on the
/// blocking pool.
pub async fn extract_text(content: Vec<u8>) -> Result<String> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&content))
        .await
        .map_err(|e| AdapterError::Decode(format!("PDF extraction task failed: {e}")))?
        .map_err(|e| AdapterError::InvalidInput(format!("No se pudo leer el PDF: {e}")))?;
    Ok(clean_text(&text))
}

/// Normalise line endings, drop control characters and collapse the runs
/// of blank lines that PDF text extraction tends to produce.
pub fn clean_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line: String = line
            .chars()
            .filter(|c| !c.is_control() || *c == '\t')
            .collect();
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
