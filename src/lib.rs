//! `mzannot` annotates detected LC-MS features with candidate identities.
//!
//! Compound database entries and spectral library hits are matched on m/z, RT,
//! mobility and CCS windows. Lipids are searched against a database enumerated
//! from class templates and confirmed against the feature's fragmentation spectra,
//! from species level (`PC 34:1`) up to molecular species level (`PC 16:0_18:1`).
//! Every candidate can then be graded on the Sumner and Schymanski confidence scales
//! and ranked.
//!
//! ```
//! use mzannot::{
//!     CancellationToken, Feature, FragmentSpectrum, LipidSearch, LipidSearchParameters, Polarity,
//! };
//! use mzannot::lipid::catalog;
//!
//! let params = LipidSearchParameters::default()
//!     .with_classes(catalog::by_abbr("PC"))
//!     .with_min_msms_score(20.0);
//! let search = LipidSearch::new(params).unwrap();
//!
//! let mut features = vec![Feature::new(0, 760.5851, Polarity::Positive).with_fragment_spectrum(
//!     FragmentSpectrum::from_arrays(
//!         Polarity::Positive,
//!         Some(760.5851),
//!         &[184.0733, 478.3292, 504.3449, 760.5851],
//!         &[1000.0, 200.0, 150.0, 300.0],
//!     ),
//! )];
//! let summary = search.run(&mut features, &CancellationToken::new()).unwrap();
//! assert_eq!(summary.annotated, 1);
//! assert_eq!(features[0].lipid_annotations[0].identity(), "PC 16:0_18:1");
//! ```
pub mod candidate;
pub mod chemistry;
pub mod confidence;
pub mod database;
pub mod feature;
pub mod fragments;
pub mod lipid;
pub mod matching;
pub mod params;
pub mod prelude;
pub mod ranking;
pub mod resolver;
pub mod search;
pub mod tolerance;
pub mod utils;
pub mod validation;

pub use crate::candidate::{
    AnnotationLike, AttributeValue, CandidateIdentity, CompoundDbAnnotation, MatchedLipid,
    SpectralLibraryMatch,
};
pub use crate::chemistry::{ElementalComposition, IonType, IonizationType};
pub use crate::confidence::{AnnotationSummary, MsiLevel, SchymanskiLevel, ScoreKind, SummaryConfig};
pub use crate::database::{build_lipid_database, LipidDatabase, LipidIon};
pub use crate::feature::{Feature, FragmentSpectrum, IsotopePattern, Polarity};
pub use crate::fragments::{LipidFragment, LipidFragmentFactory};
pub use crate::lipid::{ChainParameters, LipidAnnotation, LipidClass};
pub use crate::matching::{annotate_with_compounds, MatchTolerances};
pub use crate::params::{Param, ParamDescribed, ParamLike};
pub use crate::ranking::{best_annotation, rank_annotations};
pub use crate::resolver::{LipidAnnotationResolver, SharedPeakFilter};
pub use crate::search::{CancellationToken, LipidSearch, LipidSearchParameters, SearchError};
pub use crate::tolerance::{MzTolerance, RtTolerance, ScoreBounds};
