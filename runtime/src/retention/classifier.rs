//! Significant-tag matching.

use tagkeep_core::{Image, Policy, SignificantTags};

/// Whether the image carries a tag the policy considers significant.
///
/// Under the wildcard any tag counts; untagged images are never
/// significant.
pub fn is_significant(image: &Image, policy: &Policy) -> bool {
    match &policy.significant_tags {
        SignificantTags::Any => image.is_tagged(),
        SignificantTags::Only(tags) => !image.tags.is_disjoint(tags),
    }
}
