//! 생성에 쓰이는 모델들
//!
//! 모두 미리 학습된 표를 읽기만 하며, 로드 후에는 바뀌지 않습니다.
//!
//! - [`MorphemeModel`]: 형태소별 끝소리 특징과 품사별 색인
//! - [`PosModel`]: 품사 유니그램/전이 확률
//! - [`RuleModel`]: 품사 쌍별 결합 규칙
//! - [`PreconditionTable`]: 어근 자리 후보

mod morpheme;
pub mod pattern;
mod pos;
mod precondition;
mod rule;

pub use morpheme::{MorphemeFeatures, MorphemeKey, MorphemeModel};
pub use pos::{PosModel, END_TAG};
pub use precondition::{load_literals, parse_literals, PreconditionEntry, PreconditionTable};
pub use rule::{PosPairGroup, Rule, RuleModel};
