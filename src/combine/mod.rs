//! 어미열 탐색과 결합형 생성
//!
//! - [`ChainEnumerator`]: 품사 전이 모델로 어미열 후보 만들기
//! - [`CombinationEngine`]: 어근 × 어미열 후보의 곱에 결합 규칙 적용
//! - [`write_table`] / [`read_table`]: 결합표 입출력

mod chain;
mod engine;
mod output;

pub use chain::{ChainEnumerator, ChainPath, ChainSet};
pub use engine::{CombinationEngine, Generation, NegativeCache, SocketTable};
pub use output::{read_table, write_table, CombinationResult, PROVENANCE_SEPARATOR};
