use crate::domain::model::PageText;
use crate::utils::error::{RagError, Result};
use serde::Deserialize;

/// Subset of a Vision `AnnotateFileResponse` written by asynchronous batch OCR.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateFileResponse {
    responses: Option<Vec<AnnotateImageResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    context: Option<ImageContext>,
    full_text_annotation: Option<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    page_number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    text: Option<String>,
}

#[derive(Debug, Default)]
pub struct ParsedFile {
    pub pages: Vec<PageText>,
    pub skipped: usize,
}

/// Parses one OCR output file.
///
/// A page without a number is always an error. A page without text is an
/// error unless `skip_blank_pages` is set.
pub fn parse_ocr_output(source: &str, data: &[u8], skip_blank_pages: bool) -> Result<ParsedFile> {
    let file: AnnotateFileResponse = serde_json::from_slice(data)?;
    let responses = file
        .responses
        .ok_or_else(|| RagError::processing(format!("{}: no responses", source)))?;

    let mut parsed = ParsedFile::default();
    for (index, response) in responses.into_iter().enumerate() {
        let page_number = response
            .context
            .and_then(|context| context.page_number)
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                RagError::processing(format!("{}: response {} has no pageNumber", source, index))
            })?;

        let text = response
            .full_text_annotation
            .and_then(|annotation| annotation.text)
            .filter(|text| !text.is_empty());

        match text {
            Some(text) => parsed.pages.push(PageText { page_number, text }),
            None if skip_blank_pages => {
                tracing::warn!("{}: page {} has no text, skipping", source, page_number);
                parsed.skipped += 1;
            }
            None => {
                return Err(RagError::processing(format!(
                    "{}: page {} has no text",
                    source, page_number
                )))
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ocr_file(pages: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "inputConfig": {"gcsSource": {"uri": "gs://bucket/stats.pdf"}, "mimeType": "application/pdf"},
            "responses": pages
        }))
        .unwrap()
    }

    #[test]
    fn test_parses_pages_in_file_order() {
        let data = ocr_file(json!([
            {"fullTextAnnotation": {"text": "Chapter 1\nWhat is statistics?", "pages": []}, "context": {"uri": "gs://bucket/stats.pdf", "pageNumber": 1}},
            {"fullTextAnnotation": {"text": "Variables and measurement"}, "context": {"pageNumber": 2}}
        ]));

        let parsed = parse_ocr_output("ocr/output-1-to-2.json", &data, false).unwrap();

        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.pages,
            vec![
                PageText {
                    page_number: 1,
                    text: "Chapter 1\nWhat is statistics?".to_string()
                },
                PageText {
                    page_number: 2,
                    text: "Variables and measurement".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_responses_is_error() {
        let data = serde_json::to_vec(&json!({"inputConfig": {}})).unwrap();
        let err = parse_ocr_output("a.json", &data, false).unwrap_err();
        assert!(err.to_string().contains("no responses"));
    }

    #[test]
    fn test_missing_page_number_is_error_even_when_skipping() {
        let data = ocr_file(json!([{"fullTextAnnotation": {"text": "orphan"}, "context": {}}]));
        assert!(parse_ocr_output("a.json", &data, true).is_err());
    }

    #[test]
    fn test_blank_page_fails_unless_skipped() {
        let data = ocr_file(json!([
            {"context": {"pageNumber": 7}},
            {"fullTextAnnotation": {"text": "Page eight"}, "context": {"pageNumber": 8}}
        ]));

        let err = parse_ocr_output("a.json", &data, false).unwrap_err();
        assert!(err.to_string().contains("page 7 has no text"));

        let parsed = parse_ocr_output("a.json", &data, true).unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.pages[0].page_number, 8);
    }

    #[test]
    fn test_whitespace_only_page_is_kept() {
        let data = ocr_file(json!([
            {"fullTextAnnotation": {"text": "\n"}, "context": {"pageNumber": 4}},
            {"fullTextAnnotation": {"text": ""}, "context": {"pageNumber": 5}}
        ]));

        let parsed = parse_ocr_output("a.json", &data, true).unwrap();
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.pages[0].page_number, 4);
        assert_eq!(parsed.pages[0].text, "\n");
        assert_eq!(parsed.skipped, 1);

        let err = parse_ocr_output("a.json", &data, false).unwrap_err();
        assert!(err.to_string().contains("page 5 has no text"));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = parse_ocr_output("a.json", b"{ not json", false).unwrap_err();
        assert!(matches!(err, RagError::SerializationError(_)));
    }
}
