pub mod xml;

use crate::data::osm::Element;
use crate::errors::Result;

/// A dataset that can be traversed from the start any number of times. Every
/// extraction pass opens its own stream; nothing is shared between passes.
pub trait OsmSource {
    type Stream: Iterator<Item = Result<Element>>;

    fn stream(&self) -> Result<Self::Stream>;
}
