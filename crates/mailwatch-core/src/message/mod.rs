//! Canonical message model and the normalizer that produces it.

mod model;
mod normalize;
mod prefix;

pub use model::{Attribute, Message, MessageId, RawHandle};
pub use normalize::{FieldMap, Normalizer};
pub use prefix::{SubjectPrefix, strip_all_prefixes};
