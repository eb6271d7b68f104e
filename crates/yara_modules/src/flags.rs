//! Combinable feature flags controlling which module schemas load.

use bitflags::bitflags;

bitflags! {
    /// Which schema groups `ModulePool::new` should load. Names are
    /// intentionally generic placeholders: this engine carries no standard
    /// module catalogue content, only the loader.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FeatureFlags: u8 {
        const BASIC      = 0b0001;
        const VENDOR_A   = 0b0010;
        const VENDOR_B   = 0b0100;
        const DEPRECATED = 0b1000;
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags::BASIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_with_bitor() {
        let combo = FeatureFlags::BASIC | FeatureFlags::VENDOR_A;
        assert!(combo.contains(FeatureFlags::BASIC));
        assert!(combo.contains(FeatureFlags::VENDOR_A));
        assert!(!combo.contains(FeatureFlags::DEPRECATED));
    }

    #[test]
    fn default_is_basic_only() {
        assert_eq!(FeatureFlags::default(), FeatureFlags::BASIC);
    }
}
