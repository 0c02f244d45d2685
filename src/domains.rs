use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{MksubError, Result};

/// 从文件读取域名列表，一行一个，忽略空行
pub fn load_domains(path: &Path) -> Result<Vec<String>> {
    let read_err = |source: std::io::Error| MksubError::ReadInput { path: path.to_path_buf(), source };
    let file = File::open(path).map_err(read_err)?;

    let mut domains = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(read_err)?;
        let domain = line.trim();
        if !domain.is_empty() {
            domains.push(domain.to_string());
        }
    }
    Ok(domains)
}

/// 确定基础域名列表：命令行给出的域名优先，否则读取域名文件
pub fn resolve_domains(flags: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let from_flags: Vec<String> = flags
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();

    if !from_flags.is_empty() {
        return Ok(from_flags);
    }

    match file {
        Some(path) => load_domains(path),
        None => Err(MksubError::NoDomainInput),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_win_over_file() {
        let domains = resolve_domains(
            &["example.com".to_string()],
            Some(Path::new("/nonexistent/domains.txt")),
        )
        .unwrap();
        assert_eq!(domains, vec!["example.com"]);
    }

    #[test]
    fn test_no_input() {
        assert!(matches!(resolve_domains(&[], None), Err(MksubError::NoDomainInput)));
        assert!(matches!(
            resolve_domains(&["  ".to_string()], None),
            Err(MksubError::NoDomainInput)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "example.com\n\n  test.org \r\n").unwrap();

        let domains = resolve_domains(&[], Some(file.path())).unwrap();
        assert_eq!(domains, vec!["example.com", "test.org"]);
    }

    #[test]
    fn test_unreadable_file_is_error_not_panic() {
        let err = load_domains(Path::new("/nonexistent/domains.txt")).unwrap_err();
        assert!(matches!(err, MksubError::ReadInput { .. }));
    }
}
