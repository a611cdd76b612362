//! 미리 결합된 어간 목록 생성
//!
//! 결합표의 용언 어근(V, A) 결과에서 "어근 꼬리 형태 + 품사 + 양성 조건"별로
//! 결합형 첫 글자 집합과 소켓 번호를 모은 뒤, 형태소 표의 용언 중
//! 그 꼬리로 끝나는 것들을 `어간+꼬리` 로 나누어 내보냅니다.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::combine::CombinationResult;
use crate::core::phonology::is_positive;
use crate::error::{CombineError, Result};

/// 어근 품사 (결합표 첫 출처의 품사)
const ROOT_TAGS: [&str; 2] = ["V", "A"];
/// 조건 없이 찾지 못했을 때 쓰는 대표 품사
const FALLBACK_TAG: &str = "VV";

/// (꼬리 형태, 품사, 양성 조건)
type ConditionKey = (String, String, String);

/// 꼬리 하나에 모인 정보
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketCondition {
    /// 결합형 첫 글자들
    pub initials: BTreeSet<char>,
    pub socket: Option<u32>,
}

/// 출력 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecombinedEntry {
    pub stem: String,
    pub suffix: String,
    pub tag: String,
    pub initials: String,
    pub socket: Option<u32>,
}

impl fmt::Display for PrecombinedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}\t{}\t{}\t", self.stem, self.suffix, self.tag, self.initials)?;
        if let Some(socket) = self.socket {
            write!(f, "{}", socket)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrecombinedBuilder {
    conditions: FxHashMap<ConditionKey, SocketCondition>,
    suffixes: FxHashSet<String>,
}

impl PrecombinedBuilder {
    /// 결합 결과로부터 조건 표 구성
    pub fn from_results<'r>(results: impl IntoIterator<Item = &'r CombinationResult>) -> Self {
        let mut builder = Self::default();
        for result in results {
            builder.record(result);
        }
        log::info!(
            "미리 결합 조건: {}개 (꼬리 {}종)",
            builder.conditions.len(),
            builder.suffixes.len()
        );
        builder
    }

    /// 결합표 파일에서 구성
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let results = crate::combine::read_table(path)?;
        Ok(Self::from_results(&results))
    }

    fn record(&mut self, result: &CombinationResult) {
        let Some((form, tag)) = result.provenance.first() else {
            return;
        };
        if !ROOT_TAGS.contains(&tag.as_str()) {
            return;
        }
        let Some(initial) = result.surface.chars().next() else {
            return;
        };
        let positivity = result
            .condition
            .as_deref()
            .filter(|c| c.contains("Positive"))
            .unwrap_or("")
            .to_owned();
        self.suffixes.insert(form.clone());
        let entry = self
            .conditions
            .entry((form.clone(), format!("V{}", tag), positivity))
            .or_insert_with(|| SocketCondition {
                initials: BTreeSet::new(),
                socket: result.socket,
            });
        entry.initials.insert(initial);
    }

    pub fn condition(&self, suffix: &str, tag: &str, positivity: &str) -> Option<&SocketCondition> {
        self.conditions
            .get(&(suffix.to_owned(), tag.to_owned(), positivity.to_owned()))
    }

    /// 품사와 어간 양성 여부로 조건 찾기
    ///
    /// (품사, 양성) → (품사, 무관) → (VV, 양성) → (VV, 무관) 순서
    pub fn find_condition(&self, suffix: &str, stem: &str, tag: &str) -> Option<&SocketCondition> {
        let positivity = if is_positive(stem) { "+Positive" } else { "-Positive" };
        self.condition(suffix, tag, positivity)
            .or_else(|| self.condition(suffix, tag, ""))
            .or_else(|| self.condition(suffix, FALLBACK_TAG, positivity))
            .or_else(|| self.condition(suffix, FALLBACK_TAG, ""))
    }

    /// 알려진 꼬리로 나누기 (두 글자 우선, 어간은 비면 안 됨)
    fn split<'f>(&self, form: &'f str) -> Option<(&'f str, &'f str)> {
        let boundaries: Vec<usize> = form.char_indices().map(|(i, _)| i).collect();
        let n = boundaries.len();
        [2, 1]
            .into_iter()
            .filter(|&k| n >= k)
            .find_map(|k| {
                let (stem, suffix) = form.split_at(boundaries[n - k]);
                self.suffixes.contains(suffix).then_some((stem, suffix))
            })
            .filter(|(stem, _)| !stem.is_empty())
    }

    /// 형태소 표 텍스트에서 미리 결합된 어간 추출
    pub fn extract(&self, text: &str) -> Vec<PrecombinedEntry> {
        let mut out = Vec::new();
        for line in text.lines() {
            let fields: Vec<&str> = line.trim().split('\t').collect();
            if fields.len() < 3 {
                continue;
            }
            let (form, tag) = (fields[0], fields[1]);
            let verbal = (tag.starts_with('V') && !tag.starts_with("VC")) || tag == "XSV" || tag == "XSA";
            if !verbal {
                continue;
            }
            let Some((stem, suffix)) = self.split(form) else {
                continue;
            };
            let Some(cond) = self.find_condition(suffix, stem, tag) else {
                continue;
            };
            out.push(PrecombinedEntry {
                stem: stem.to_owned(),
                suffix: suffix.to_owned(),
                tag: tag.to_owned(),
                initials: cond.initials.iter().collect(),
                socket: cond.socket,
            });
        }
        out
    }

    /// 형태소 표 파일을 읽어 결과 파일로 저장
    pub fn extract_file(&self, morphemes: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<usize> {
        let morphemes = morphemes.as_ref();
        let text = fs::read_to_string(morphemes).map_err(|e| CombineError::io(morphemes.display().to_string(), e))?;
        let entries = self.extract(&text);

        let output = output.as_ref();
        let name = output.display().to_string();
        let file = File::create(output).map_err(|e| CombineError::io(name.clone(), e))?;
        let mut out = BufWriter::new(file);
        for entry in &entries {
            writeln!(out, "{}", entry).map_err(|e| CombineError::io(name.clone(), e))?;
        }
        out.flush().map_err(|e| CombineError::io(name.clone(), e))?;
        log::info!("미리 결합 목록 저장: {} ({}줄)", name, entries.len());
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(surface: &str, form: &str, tag: &str, cond: Option<&str>, socket: Option<u32>) -> CombinationResult {
        CombinationResult {
            surface: surface.to_owned(),
            provenance: vec![(form.to_owned(), tag.to_owned()), ("어".to_owned(), "EC".to_owned())],
            condition: cond.map(str::to_owned),
            socket,
        }
    }

    fn builder() -> PrecombinedBuilder {
        PrecombinedBuilder::from_results(&[
            result("해", "하", "V", None, Some(1)),
            result("하여", "하", "V", None, Some(1)),
            result("가", "가", "V", Some("+Positive"), Some(2)),
            result("거", "가", "V", Some("-Positive"), Some(3)),
            result("고와", "고", "A", Some("-Coda"), Some(4)),
            // 어근이 용언이 아니면 무시
            result("아요", "아", "EC", None, None),
        ])
    }

    #[test]
    fn test_record() {
        let b = builder();
        let ha = b.condition("하", "VV", "").unwrap();
        assert_eq!(ha.initials.iter().collect::<String>(), "하해");
        assert_eq!(ha.socket, Some(1));
        // Positive 가 아닌 조건은 무관으로 취급
        assert!(b.condition("고", "VA", "").is_some());
        assert!(b.condition("아", "VEC", "").is_none());
    }

    #[test]
    fn test_find_condition_fallback() {
        let b = builder();
        // 양성 어간
        assert_eq!(b.find_condition("가", "나", "VV").unwrap().socket, Some(2));
        // 음성 어간
        assert_eq!(b.find_condition("가", "머", "VV").unwrap().socket, Some(3));
        // XSV 는 VV 로 대체
        assert_eq!(b.find_condition("하", "공부", "XSV").unwrap().socket, Some(1));
        assert!(b.find_condition("고", "아름", "VV").is_none());
    }

    #[test]
    fn test_extract() {
        let b = builder();
        let text = "공부하\tXSV\t10\n\
                    사랑하\tVV\t5\n\
                    하\tVV\t100\n\
                    이\tVCP\t100\n\
                    학교\tNNG\t50\n\
                    짧\tVA\t1\n";
        let entries = b.extract(text);
        let lines: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
        assert_eq!(lines, ["공부+하\tXSV\t하해\t1", "사랑+하\tVV\t하해\t1"]);
    }

    #[test]
    fn test_two_char_suffix_preferred() {
        let b = PrecombinedBuilder::from_results(&[
            result("하", "하", "V", None, Some(1)),
            result("다해", "다하", "V", None, Some(2)),
        ]);
        let entries = b.extract("못다하\tVV\t1\n다하\tVV\t1\n");
        // 두 글자 꼬리에 걸리면 어간이 비어도 한 글자 꼬리로 다시 나누지 않음
        assert_eq!(entries.len(), 1);
        assert_eq!((entries[0].stem.as_str(), entries[0].suffix.as_str()), ("못", "다하"));
        assert_eq!(entries[0].socket, Some(2));
    }

    #[test]
    fn test_extract_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("morphemes.txt");
        let output = dir.path().join("precombined.txt");
        fs::write(&input, "공부하\tXSV\t10\n").unwrap();
        assert_eq!(builder().extract_file(&input, &output).unwrap(), 1);
        assert_eq!(fs::read_to_string(&output).unwrap(), "공부+하\tXSV\t하해\t1\n");
    }
}
