//! Anchor resolution: the oldest significant image of a repository.

use tagkeep_core::{Image, Policy};

use super::classifier::is_significant;

/// The image that opens a policy's protection window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor<'a> {
    /// Position in the (ascending) image slice
    pub index: usize,
    pub image: &'a Image,
}

/// Find the first significant image in push order.
///
/// `images` must already be sorted oldest first; among images pushed at the
/// same instant the slice order decides.
pub fn find_anchor<'a>(images: &'a [Image], policy: &Policy) -> Option<Anchor<'a>> {
    images
        .iter()
        .enumerate()
        .find(|(_, image)| is_significant(image, policy))
        .map(|(index, image)| Anchor { index, image })
}
