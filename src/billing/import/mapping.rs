use std::collections::HashMap;
use std::sync::OnceLock;

use super::normalizer::fold_key;

/// Categorical schedule tag carried by imported rows. The tag only selects
/// the condition kind; time-window bounds come from the caller's
/// [`ScheduleWindows`](super::ScheduleWindows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTag {
    Fixed,
    Morning,
    Afternoon,
    Saturday,
}

static TAG_MAP: OnceLock<HashMap<String, ScheduleTag>> = OnceLock::new();

/// Look up a raw tag value. Unknown tags yield `None`; the importer treats
/// that as an unconditioned rate.
pub(crate) fn tag_for(raw: &str) -> Option<ScheduleTag> {
    tag_map().get(&fold_key(raw)).copied()
}

fn tag_map() -> &'static HashMap<String, ScheduleTag> {
    TAG_MAP.get_or_init(|| {
        const ALIASES: &[(&str, ScheduleTag)] = &[
            // Fixed / unconditioned
            ("fixed", ScheduleTag::Fixed),
            ("fija", ScheduleTag::Fixed),
            ("fijo", ScheduleTag::Fixed),
            ("horario fijo", ScheduleTag::Fixed),
            // Morning
            ("morning", ScheduleTag::Morning),
            ("ma\u{f1}ana", ScheduleTag::Morning),
            ("manana", ScheduleTag::Morning),
            ("matutino", ScheduleTag::Morning),
            ("am", ScheduleTag::Morning),
            // Afternoon
            ("afternoon", ScheduleTag::Afternoon),
            ("tarde", ScheduleTag::Afternoon),
            ("vespertino", ScheduleTag::Afternoon),
            ("pm", ScheduleTag::Afternoon),
            // Saturday
            ("saturday", ScheduleTag::Saturday),
            ("s\u{e1}bado", ScheduleTag::Saturday),
            ("sabado", ScheduleTag::Saturday),
            ("sabatino", ScheduleTag::Saturday),
            ("sat", ScheduleTag::Saturday),
        ];

        let mut map = HashMap::with_capacity(ALIASES.len());
        for (alias, tag) in ALIASES {
            map.insert(fold_key(alias), *tag);
        }
        map
    })
}
