//! Output file names for each operation.

use std::path::Path;

use crate::edit::PageFormat;

/// An operation that produces an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Compress,
    Rotate,
    Edit,
    Convert,
    Resize(PageFormat),
    Watermark,
    Protect,
    Unlock,
}

impl Operation {
    /// Suffix appended to the input's stem, including the extension.
    pub fn suffix(self) -> String {
        match self {
            Operation::Compress => "_comprimido.pdf".into(),
            Operation::Rotate => "_rotado.pdf".into(),
            Operation::Edit => "_editado.pdf".into(),
            Operation::Convert => "_convertido.docx".into(),
            Operation::Resize(format) => format!("_{}.pdf", format),
            Operation::Watermark => "_watermark.pdf".into(),
            Operation::Protect => "_protegido.pdf".into(),
            Operation::Unlock => String::new(),
        }
    }
}

const UNLOCK_PREFIX: &str = "desbloqueado_";

/// Name of the file `op` produces from `input`.
///
/// Any directory part of `input` is dropped.
///
/// ```
/// use pdfsuite::naming::{output_name, Operation};
///
/// assert_eq!(output_name("scan.pdf", Operation::Compress), "scan_comprimido.pdf");
/// assert_eq!(output_name("scan.pdf", Operation::Unlock), "desbloqueado_scan.pdf");
/// ```
pub fn output_name(input: &str, op: Operation) -> String {
    let path = Path::new(input);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());

    if op == Operation::Unlock {
        return format!("{}{}", UNLOCK_PREFIX, file_name);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{}{}", stem, op.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_table() {
        assert_eq!(output_name("a.pdf", Operation::Compress), "a_comprimido.pdf");
        assert_eq!(output_name("a.pdf", Operation::Rotate), "a_rotado.pdf");
        assert_eq!(output_name("a.pdf", Operation::Edit), "a_editado.pdf");
        assert_eq!(output_name("a.pdf", Operation::Convert), "a_convertido.docx");
        assert_eq!(
            output_name("a.pdf", Operation::Resize(PageFormat::A4)),
            "a_A4.pdf"
        );
        assert_eq!(output_name("a.pdf", Operation::Watermark), "a_watermark.pdf");
        assert_eq!(output_name("a.pdf", Operation::Protect), "a_protegido.pdf");
        assert_eq!(output_name("a.pdf", Operation::Unlock), "desbloqueado_a.pdf");
    }

    #[test]
    fn test_directories_and_odd_names() {
        assert_eq!(
            output_name("in/dir/report.v2.pdf", Operation::Compress),
            "report.v2_comprimido.pdf"
        );
        assert_eq!(output_name("noext", Operation::Rotate), "noext_rotado.pdf");
        assert_eq!(output_name("", Operation::Edit), "document_editado.pdf");
    }
}
