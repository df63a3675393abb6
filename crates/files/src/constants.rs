//! Fixed placeholder attachment used when the caller selects no files.

/// Filename given to the synthesised placeholder attachment.
pub const PLACEHOLDER_FILENAME: &str = "invoice-placeholder.pdf";

/// Minimal single-page PDF used as the placeholder payload.
pub const PLACEHOLDER_PAYLOAD: &[u8] = b"%PDF-1.4
1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj
2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj
3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj
trailer<</Root 1 0 R>>
%%EOF
";
