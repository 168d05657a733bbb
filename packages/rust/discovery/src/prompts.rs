//! Prompt templates for the two generation calls of a discovery round.

/// Prompt asking the model to propose `count` image URLs.
pub fn generation_prompt(count: usize, excluded_source: &str, max_file_size_kb: u32) -> String {
    format!(
        "Generate {count} public domain image URLs (either JPEG or PNG format) \
         from trusted public domain image repositories. Exclude {excluded_source} \
         and related sites. The URL must directly point to a valid image file \
         ending with .jpg or .png, and the file size must be less than \
         {max_file_size_kb} KB. Provide the final image URLs in plain text."
    )
}

/// Prompt asking the model to restate every URL in `contents`, one per line.
pub fn extraction_prompt(contents: &str) -> String {
    format!(
        "Extract all URLs from the following contents into a plain text list. \
         Each URL must be on a new line, with no other text, numbering or \
         formatting. These are the contents: {contents}"
    )
}
