use super::model::Transition;

/// SiO(v=0) rotational transitions J=1-0 through J=20-19, laboratory rest
/// frequencies in GHz. Ordered by increasing frequency.
pub const SIO_V0_TRANSITIONS: [Transition; 20] = [
    t("J=1-0", 43.423864),
    t("J=2-1", 86.846960),
    t("J=3-2", 130.268610),
    t("J=4-3", 173.688310),
    t("J=5-4", 217.104980),
    t("J=6-5", 260.518200),
    t("J=7-6", 303.927030),
    t("J=8-7", 347.331000),
    t("J=9-8", 390.728730),
    t("J=10-9", 434.120450),
    t("J=11-10", 477.506120),
    t("J=12-11", 520.885480),
    t("J=13-12", 564.258560),
    t("J=14-13", 607.625260),
    t("J=15-14", 650.985560),
    t("J=16-15", 694.339440),
    t("J=17-16", 737.686780),
    t("J=18-17", 781.027470),
    t("J=19-18", 824.361490),
    t("J=20-19", 867.688720),
];

const fn t(label: &'static str, rest_frequency_ghz: f64) -> Transition {
    Transition {
        label,
        rest_frequency_ghz,
    }
}

/// The full transition table.
pub fn sio_v0() -> &'static [Transition] {
    &SIO_V0_TRANSITIONS
}
