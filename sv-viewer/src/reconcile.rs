use crate::ViewerProps;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropField {
    Width,
    Height,
    Zoom,
    Variant,
    SkinUrl,
    CapeUrl,
    Animation,
    AnimationSpeed,
}

/// The narrowest update that brings a mounted session in line with a changed prop.
///
/// Ordered by how much they tear down; a plan runs them in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Effect {
    /// Tear down and recreate camera, controls and models.
    Remount,
    /// Dispose the player model and build a new one; the cape moves over.
    RebuildPlayer,
    LoadSkin,
    LoadCape,
    /// Retarget the animation state in place.
    Animate,
}

pub const RECONCILE_TABLE: [(PropField, Effect); 8] = [
    (PropField::Width, Effect::Remount),
    (PropField::Height, Effect::Remount),
    (PropField::Zoom, Effect::Remount),
    (PropField::Variant, Effect::RebuildPlayer),
    (PropField::SkinUrl, Effect::LoadSkin),
    (PropField::CapeUrl, Effect::LoadCape),
    (PropField::Animation, Effect::Animate),
    (PropField::AnimationSpeed, Effect::Animate),
];

pub fn effect_for(field: PropField) -> Effect {
    RECONCILE_TABLE
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, effect)| *effect)
        .unwrap_or(Effect::Remount)
}

pub fn changed_fields(old: &ViewerProps, new: &ViewerProps) -> Vec<PropField> {
    let checks = [
        (PropField::Width, old.width != new.width),
        (PropField::Height, old.height != new.height),
        (PropField::Zoom, old.effective_zoom() != new.effective_zoom()),
        (PropField::Variant, old.variant != new.variant),
        (PropField::SkinUrl, old.skin() != new.skin()),
        (PropField::CapeUrl, old.cape() != new.cape()),
        (PropField::Animation, old.animation != new.animation),
        (
            PropField::AnimationSpeed,
            old.animation_speed.to_bits() != new.animation_speed.to_bits(),
        ),
    ];
    checks
        .into_iter()
        .filter_map(|(field, changed)| changed.then_some(field))
        .collect()
}

/// Effects to run for the transition `old -> new`, deduplicated and in order.
///
/// A remount rebuilds the models and reloads both textures from the new props, so it absorbs
/// the player and texture effects. Animation changes never need a rebuild.
pub fn plan(old: &ViewerProps, new: &ViewerProps) -> Vec<Effect> {
    let mut effects: Vec<Effect> = changed_fields(old, new)
        .into_iter()
        .map(effect_for)
        .collect();
    effects.sort();
    effects.dedup();
    if effects.first() == Some(&Effect::Remount) {
        effects.retain(|e| matches!(e, Effect::Remount | Effect::Animate));
    }
    effects
}

#[cfg(test)]
mod tests {
    use sv_atlas::BodyVariant;
    use sv_model::AnimationKind;

    use super::*;

    #[test]
    fn unchanged_props_do_nothing() {
        let props = ViewerProps::default();
        assert!(plan(&props, &props.clone()).is_empty());
    }

    #[test]
    fn variant_only_rebuilds_the_player() {
        let old = ViewerProps::default();
        let new = ViewerProps {
            variant: BodyVariant::Slim,
            ..old.clone()
        };
        assert_eq!(plan(&old, &new), vec![Effect::RebuildPlayer]);
    }

    #[test]
    fn resize_absorbs_texture_and_player_work() {
        let old = ViewerProps::default();
        let new = ViewerProps {
            width: 640,
            variant: BodyVariant::Slim,
            skin_url: Some("a.png".into()),
            animation: AnimationKind::Walk,
            ..old.clone()
        };
        assert_eq!(plan(&old, &new), vec![Effect::Remount, Effect::Animate]);
    }

    #[test]
    fn animation_changes_are_in_place() {
        let old = ViewerProps::default();
        let new = ViewerProps {
            animation: AnimationKind::Walk,
            animation_speed: 2.0,
            ..old.clone()
        };
        assert_eq!(plan(&old, &new), vec![Effect::Animate]);
    }

    #[test]
    fn blank_urls_equal_none() {
        let old = ViewerProps::default();
        let new = ViewerProps {
            cape_url: Some("  ".into()),
            skin_url: Some(String::new()),
            ..old.clone()
        };
        assert!(plan(&old, &new).is_empty());
    }

    #[test]
    fn every_field_has_an_entry() {
        let fields = [
            PropField::Width,
            PropField::Height,
            PropField::Zoom,
            PropField::Variant,
            PropField::SkinUrl,
            PropField::CapeUrl,
            PropField::Animation,
            PropField::AnimationSpeed,
        ];
        for field in fields {
            assert!(RECONCILE_TABLE.iter().any(|(f, _)| *f == field), "{field:?}");
        }
    }
}
