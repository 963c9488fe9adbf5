pub mod constraints;
pub mod defaults;
pub mod error;
pub mod expr;
pub mod fuel;
pub mod material;
pub mod operation;
pub mod optimizer;
pub mod oxide;
pub mod pipeline;
pub mod quality;
pub mod recompute;
pub mod report;
pub mod targets;

pub use constraints::{QualityConstraint, build_quality_constraints};
pub use error::{BlendError, ModelError};
pub use expr::{Linear, LinearExpr};
pub use fuel::{AshLoad, Fuel, FuelFlow, FuelSummary};
pub use material::{DustStream, Material, validate_materials};
pub use operation::{DustRoute, OperationalConstants};
pub use optimizer::{
    BlendModel, BlendOptimizer, DerivedQuantities, MaterialShare, SolveStatus, SolvedBlend, build_and_solve,
};
pub use oxide::{Composition, Oxide, OxideVector};
pub use pipeline::{MassBalance, StageChain, Tonnage, clinker, kiln_feed, loi_free_factor, raw_meal, unignited};
pub use quality::{Bogue, Moduli};
pub use recompute::{Recomputation, StageModuli, recompute};
pub use report::{BlendReport, DustFlows, MaterialRow, Stage, StageRow};
pub use targets::{Limits, ObjectiveMode, QualityIndex, QualityTargets};
