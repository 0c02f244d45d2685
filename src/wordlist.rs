//! 字典加载
//!
//! 每个词先转小写，再去掉首尾空白和 `.`，空词丢弃，然后按可选正则过滤并去重。
//! 去重后的词按字典序保存，生成任务的遍历顺序因此是确定的；
//! 但多个任务并发交错，最终输出顺序仍然不保证。

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use crate::error::{MksubError, Result};

/// 编译字典过滤正则，空串视为不过滤
pub fn compile_filter(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern {
        None | Some("") => Ok(None),
        Some(p) => Regex::new(p).map(Some).map_err(|source| MksubError::InvalidRegex {
            pattern: p.to_string(),
            source,
        }),
    }
}

/// 规范化一个字典词
pub fn normalize_word(raw: &str) -> Option<String> {
    let word = raw.trim().to_lowercase();
    let word = word.trim_matches('.');
    if word.is_empty() {
        None
    } else {
        Some(word.to_string())
    }
}

/// 去重后的只读词集
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSet {
    words: Vec<String>,
}

impl WordSet {
    pub fn from_words<I, S>(words: I, filter: Option<&Regex>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = words
            .into_iter()
            .filter_map(|w| normalize_word(w.as_ref()))
            // 非锚定匹配，词中任意位置命中即可
            .filter(|w| filter.map_or(true, |re| re.is_match(w)))
            .collect();

        WordSet { words: set.into_iter().collect() }
    }

    pub fn from_reader<R: BufRead>(reader: R, filter: Option<&Regex>) -> io::Result<Self> {
        let lines = reader.lines().collect::<io::Result<Vec<String>>>()?;
        Ok(Self::from_words(lines, filter))
    }

    /// 从字典文件加载
    pub fn load(path: &Path, filter: Option<&Regex>) -> Result<Self> {
        let read_err = |source: std::io::Error| MksubError::ReadInput { path: path.to_path_buf(), source };
        let file = File::open(path).map_err(read_err)?;
        Self::from_reader(BufReader::new(file), filter).map_err(read_err)
    }

    /// 按正则再过滤一次，返回新词集
    pub fn retain_matching(&self, filter: &Regex) -> Self {
        WordSet {
            words: self.words.iter().filter(|w| filter.is_match(w)).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.binary_search_by(|w| w.as_str().cmp(word)).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.words.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }
}

impl<'a> IntoIterator for &'a WordSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("Foo."), Some("foo".to_string()));
        assert_eq!(normalize_word("..API..\r"), Some("api".to_string()));
        assert_eq!(normalize_word("..."), None);
        assert_eq!(normalize_word("   "), None);
    }

    #[test]
    fn test_mixed_case_duplicates_collapse() {
        let set = WordSet::from_words(["Foo.", "foo", "FOO", "bar"], None);

        assert_eq!(set.len(), 2);
        assert!(set.contains("foo"));
        assert!(set.contains("bar"));
    }

    #[test]
    fn test_regex_filter() {
        let re = compile_filter(Some("^a")).unwrap();
        let set = WordSet::from_words(["api", "dev", "app"], re.as_ref());

        assert_eq!(set.as_slice(), ["api".to_string(), "app".to_string()]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let re = compile_filter(Some("[0-9]")).unwrap().unwrap();
        let set = WordSet::from_words(["a1", "b", "c22", "D3."], Some(&re));
        let again = set.retain_matching(&re);

        assert_eq!(set, again);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_filter_applies_after_normalization() {
        // `.Dev` 先变成 `dev` 再参与匹配
        let re = compile_filter(Some("^dev$")).unwrap();
        let set = WordSet::from_words([".Dev", "devops"], re.as_ref());

        assert_eq!(set.as_slice(), ["dev".to_string()]);
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let err = compile_filter(Some("(unclosed")).unwrap_err();
        assert!(matches!(err, MksubError::InvalidRegex { .. }));
        assert!(compile_filter(Some("")).unwrap().is_none());
    }

    #[test]
    fn test_from_reader_skips_blank_lines() {
        let input = Cursor::new("www\n\n.mail.\nwww\n");
        let set = WordSet::from_reader(input, None).unwrap();

        assert_eq!(set.as_slice(), ["mail".to_string(), "www".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = WordSet::load(Path::new("/nonexistent/words.txt"), None).unwrap_err();
        assert!(matches!(err, MksubError::ReadInput { .. }));
    }
}
