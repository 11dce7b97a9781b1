//! Prompts for the generative refinement service.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing refinement behaviour means
//!    editing exactly one place.
//! 2. **Testability** — unit tests inspect prompt selection directly without
//!    touching the network.
//!
//! Prompt selection is driven by [`language_hint`], a pure classifier kept
//! independent of the HTTP client so it can be tested on plain strings.

/// Which refinement prompt fits the recognised text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageHint {
    /// Vietnamese diacritics detected.
    Vietnamese,
    /// Plain ASCII / anything else.
    Plain,
}

/// Lower-case Vietnamese vowels with diacritics; a single hit is a strong
/// signal since none of these occur in English text.
const VIETNAMESE_MARKERS: &str = "àáâãèéêìíòóôõùúýỳỹỷỵăắằẳẵặâấầẩẫậđêếềểễệôốồổỗộơớờởỡợưứừửữự";

/// Classify text for prompt selection.
pub fn language_hint(text: &str) -> LanguageHint {
    let has_marker = text
        .chars()
        .flat_map(|c| c.to_lowercase())
        .any(|c| VIETNAMESE_MARKERS.contains(c));
    if has_marker {
        LanguageHint::Vietnamese
    } else {
        LanguageHint::Plain
    }
}

/// Build the rewrite prompt for the recognised text.
pub fn refine_prompt(text: &str) -> String {
    match language_hint(text) {
        LanguageHint::Vietnamese => format!(
            "Bạn là một chuyên gia xử lý văn bản tiếng Việt. Hãy:\n\
             1. Sửa các lỗi OCR phổ biến (thiếu dấu, nhầm font, khoảng cách)\n\
             2. Chuẩn hóa cách viết (chính tả, ngữ pháp)\n\
             3. Giữ nguyên nội dung gốc\n\
             4. Loại bỏ nhiễu/nội dung không liên quan\n\
             Văn bản cần xử lý:\n{text}\n\
             Yêu cầu:\n\
             - Chỉ trả về văn bản đã được sửa, không thêm bất kỳ ghi chú nào\n\
             - Giữ nguyên ngắt dòng nếu cần thiết\n\
             - Đảm bảo tính tự nhiên của tiếng Việt"
        ),
        LanguageHint::Plain => format!(
            "You are an English text refinement expert. Please:\n\
             1. Correct common OCR errors (character recognition mistakes)\n\
             2. Normalize spacing and punctuation\n\
             3. Preserve original meaning\n\
             4. Remove noise/unrelated content\n\
             Text to process:\n{text}\n\
             Requirements:\n\
             - Return only the corrected text without any additional notes\n\
             - Preserve line breaks when appropriate\n\
             - Maintain natural English flow"
        ),
    }
}

/// Build the independent quality-rating prompt.
pub fn rate_prompt(text: &str) -> String {
    format!(
        "You are judging the output of an OCR system. Rate how likely the \
         following text is a faithful, readable extraction of a real document, \
         on a scale from 0 (garbage) to 100 (perfect).\n\
         Text:\n{text}\n\
         Reply with a single number between 0 and 100 and nothing else."
    )
}
