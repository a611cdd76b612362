//! 결합표 입출력
//!
//! 한 줄에 결과 하나:
//! `표면형 \t 형태/품사+형태/품사... \t 경계 조건 \t 소켓 번호`

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{CombineError, Result};

/// 출처 형태소 구분자
pub const PROVENANCE_SEPARATOR: char = '+';

/// 생성된 결합형 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationResult {
    pub surface: String,
    /// 결합에 쓰인 (형태, 품사) 순서열
    pub provenance: Vec<(String, String)>,
    /// 첫 자리의 경계 조건
    pub condition: Option<String>,
    pub socket: Option<u32>,
}

impl CombinationResult {
    /// `형태/품사+형태/품사` 형식
    pub fn provenance_string(&self) -> String {
        self.provenance
            .iter()
            .map(|(form, tag)| format!("{}/{}", form, tag))
            .collect::<Vec<_>>()
            .join(&PROVENANCE_SEPARATOR.to_string())
    }

    /// 결합표 한 줄 파싱 (열이 모자라면 `None`)
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() < 2 || fields[0].is_empty() {
            return None;
        }
        let provenance = fields[1]
            .split(PROVENANCE_SEPARATOR)
            .map(|token| {
                token
                    .rsplit_once('/')
                    .map(|(form, tag)| (form.to_owned(), tag.to_owned()))
            })
            .collect::<Option<Vec<_>>>()?;
        let condition = fields.get(2).filter(|c| !c.is_empty()).map(|c| c.to_string());
        let socket = fields.get(3).and_then(|s| s.trim().parse().ok());
        Some(Self {
            surface: fields[0].to_owned(),
            provenance,
            condition,
            socket,
        })
    }
}

impl fmt::Display for CombinationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t",
            self.surface,
            self.provenance_string(),
            self.condition.as_deref().unwrap_or("")
        )?;
        if let Some(socket) = self.socket {
            write!(f, "{}", socket)?;
        }
        Ok(())
    }
}

/// 결합표 파일 쓰기
pub fn write_table(path: impl AsRef<Path>, results: &[CombinationResult]) -> Result<()> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let file = File::create(path).map_err(|e| CombineError::io(name.clone(), e))?;
    let mut out = BufWriter::new(file);
    for result in results {
        writeln!(out, "{}", result).map_err(|e| CombineError::io(name.clone(), e))?;
    }
    out.flush().map_err(|e| CombineError::io(name.clone(), e))?;
    log::info!("결합표 저장: {} ({}줄)", name, results.len());
    Ok(())
}

/// 결합표 파일 읽기 (형식이 맞지 않는 줄은 건너뜀)
pub fn read_table(path: impl AsRef<Path>) -> Result<Vec<CombinationResult>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| CombineError::io(path.display().to_string(), e))?;
    Ok(text.lines().filter_map(CombinationResult::parse_line).collect())
}
