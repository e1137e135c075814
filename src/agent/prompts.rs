//! System instruction for the assistant persona

use crate::error::{Error, Result};
use std::path::Path;

/// Flower-shop customer-service persona, sent verbatim as the first
/// message of every conversation.
pub const FLOWER_SHOP_PERSONA: &str = "Bạn là một chatbot của cửa hàng hoa. Vai trò của bạn là hỗ trợ khách hàng trong việc tìm hiểu về các sản phẩm và dịch vụ của cửa hàng, cũng như tạo một trải nghiệm mua sắm dễ chịu và thân thiện. Bạn có thể trả lời các câu hỏi về loại hoa, dịch vụ giao hàng, và hướng dẫn chăm sóc hoa. Bạn cũng có thể trò chuyện với khách hàng về các chủ đề không liên quan đến sản phẩm như thời tiết, sở thích cá nhân, và những câu chuyện thú vị để tạo sự gắn kết.
Hãy luôn giữ thái độ lịch sự và chuyên nghiệp. Nếu khách hàng hỏi về sản phẩm cụ thể, hãy cung cấp thông tin chi tiết và gợi ý các lựa chọn phù hợp. Nếu khách hàng trò chuyện về các chủ đề không liên quan đến sản phẩm, hãy tham gia vào cuộc trò chuyện một cách vui vẻ và thân thiện.
một số điểm chính bạn cần lưu ý:
1. Đáp ứng nhanh chóng và chính xác.
2. Giữ cho cuộc trò chuyện vui vẻ và thân thiện.
3. Cung cấp thông tin hữu ích về hoa và dịch vụ của cửa hàng.
4. Giữ cho cuộc trò chuyện mang tính chất hỗ trợ và giúp đỡ.
Hãy làm cho khách hàng cảm thấy được chào đón và quan tâm!";

/// Load a system prompt from a file, trimming trailing whitespace
pub fn load_system_prompt(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read system prompt {}: {}",
            path.display(),
            e
        ))
    })?;

    let prompt = content.trim_end().to_string();
    if prompt.is_empty() {
        return Err(Error::Config(format!(
            "System prompt file {} is empty",
            path.display()
        )));
    }

    Ok(prompt)
}

/// Resolve the system prompt: an explicit file wins, otherwise the built-in persona
pub fn resolve_system_prompt(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => load_system_prompt(path),
        None => Ok(FLOWER_SHOP_PERSONA.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_persona_shape() {
        assert!(FLOWER_SHOP_PERSONA.starts_with("Bạn là một chatbot của cửa hàng hoa."));
        assert!(FLOWER_SHOP_PERSONA.ends_with("được chào đón và quan tâm!"));
        assert_eq!(FLOWER_SHOP_PERSONA.lines().count(), 8);
        assert!(!FLOWER_SHOP_PERSONA.contains('\r'));
    }

    #[test]
    fn test_resolve_defaults_to_persona() {
        let prompt = resolve_system_prompt(None).unwrap();
        assert_eq!(prompt, FLOWER_SHOP_PERSONA);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "You are a bakery assistant.\n\n").unwrap();

        let prompt = resolve_system_prompt(Some(&path)).unwrap();
        assert_eq!(prompt, "You are a bakery assistant.");
    }

    #[test]
    fn test_empty_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "   \n").unwrap();

        assert!(matches!(load_system_prompt(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = tempdir().unwrap();
        assert!(load_system_prompt(dir.path().join("nope.txt")).is_err());
    }
}
