//! 通用工具函数

use uuid::Uuid;

/// 生成业务单据号,格式: `{前缀}-{YYYYMMDD}-{12 位随机十六进制}`
pub fn document_number(prefix: &str) -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, date, &id[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_number_format() {
        let number = document_number("MD");
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "MD");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 12);
    }

    #[test]
    fn test_document_number_unique() {
        let a = document_number("MD");
        let b = document_number("MD");
        assert_ne!(a, b);
    }
}
