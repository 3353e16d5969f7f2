use crate::error::{BaaError, BaaResult};
use validator::{Validate, ValidationErrors};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub fn validate_model<T: Validate>(model: &T) -> BaaResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(BaaError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.code {
                std::borrow::Cow::Borrowed("length") => {
                    format!("Length validation failed for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("range") => {
                    format!("Value out of range for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("required") => {
                    format!("Field '{}' is required", field)
                }
                _ => format!("Validation failed for field '{}': {}", field, error.code),
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

pub fn validate_file_type(file_name: &str, allowed_types: &[&str]) -> BaaResult<()> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !allowed_types.contains(&extension.to_lowercase().as_str()) {
        return Err(BaaError::validation(
            "file_type",
            format!("File type '{}' not allowed. Allowed types: {}", extension, allowed_types.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_file_size(file_size: u64, max_size: u64) -> BaaResult<()> {
    if file_size > max_size {
        return Err(BaaError::validation(
            "file_size",
            format!("File size {} bytes exceeds maximum allowed size {} bytes", file_size, max_size),
        ));
    }

    Ok(())
}

/// Accepts an upload when either the declared content type or the file name says PDF.
pub fn validate_pdf_upload(
    file_name: &str,
    content_type: Option<&str>,
    file_size: u64,
    max_size: u64,
) -> BaaResult<()> {
    let declared_pdf = content_type
        .map(|ct| ct.eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false);

    if !declared_pdf {
        validate_file_type(file_name, &["pdf"])
            .map_err(|_| BaaError::validation("file_type", "Please upload a PDF file"))?;
    }

    validate_file_size(file_size, max_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct PageRequest {
        #[validate(range(min = 1))]
        page: u32,
    }

    #[test]
    fn test_validate_model_reports_range() {
        let err = validate_model(&PageRequest { page: 0 }).unwrap_err();
        assert!(err.to_string().contains("Value out of range for field 'page'"));
        assert!(validate_model(&PageRequest { page: 3 }).is_ok());
    }

    #[test]
    fn test_validate_file_type() {
        assert!(validate_file_type("report.PDF", &["pdf"]).is_ok());
        assert!(validate_file_type("report.docx", &["pdf"]).is_err());
        assert!(validate_file_type("no_extension", &["pdf"]).is_err());
    }

    #[test]
    fn test_validate_file_size() {
        let limit = 5 * 1024 * 1024;
        assert!(validate_file_size(limit, limit).is_ok());
        assert!(validate_file_size(limit + 1, limit).is_err());
    }

    #[test]
    fn test_validate_pdf_upload() {
        let limit = 1024;
        assert!(validate_pdf_upload("scan.bin", Some("application/pdf"), 10, limit).is_ok());
        assert!(validate_pdf_upload("scan.pdf", None, 10, limit).is_ok());
        assert!(validate_pdf_upload("scan.png", Some("image/png"), 10, limit).is_err());

        let err = validate_pdf_upload("scan.pdf", None, 2048, limit).unwrap_err();
        assert!(matches!(err, BaaError::Validation { ref field, .. } if field == "file_size"));
    }
}
