//! Mapping of provider-neutral sizes to Scaleway commercial types.

use crate::size::Size;

pub(crate) const fn commercial_type(size: Size) -> &'static str {
    match size {
        Size::Micro => "STARDUST1-S",
        Size::Tiny => "DEV1-S",
        Size::Small => "DEV1-M",
        Size::Medium => "DEV1-L",
        Size::Large => "DEV1-XL",
        Size::ExtraLarge => "GP1-XS",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn every_size_maps_to_a_distinct_type() {
        let types: BTreeSet<_> = Size::ALL.into_iter().map(commercial_type).collect();
        assert_eq!(types.len(), Size::ALL.len());
    }
}
