//! 수질 화학 계산 모듈 모음.
//! 이온 데이터, 삼투압/TCF/이온강도, 난용성 염 포화도와 LSI, 표 기반 TCF 로 구성한다.

pub mod chemistry;
pub mod feed;
pub mod ions;
pub mod scaling;
pub mod tcf_table;

pub use chemistry::*;
pub use feed::FeedWater;
pub use ions::IonConcentrations;
pub use scaling::{langelier_index, saturation_ratios, SaturationRatio, ScaleCompound};
