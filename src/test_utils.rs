use crate::dataset::ElectionData;
use crate::models::Candidacy;

pub(crate) const UTTAR_PRADESH: &str = "Uttar Pradesh";
pub(crate) const KERALA: &str = "Kerala";

pub(crate) const VARANASI: &str = "Varanasi";
pub(crate) const AMETHI: &str = "Amethi";
pub(crate) const WAYANAD: &str = "Wayanad";
pub(crate) const THRISSUR: &str = "Thrissur";

pub(crate) const ALPHA: &str = "Alpha Party";
pub(crate) const BETA: &str = "Beta Front";
pub(crate) const GAMMA: &str = "Gamma League";

pub(crate) const GEN: &str = "GEN";
pub(crate) const SC: &str = "SC";

/// Rows for two elections in two states.
///
/// * 2019: Varanasi (Alpha), Amethi (Beta), Wayanad (Alpha and Gamma tie, Alpha listed first).
/// * 2024: Varanasi (Beta), Amethi (Beta, no electors), Wayanad (Gamma), Thrissur (Alpha,
///   uncontested).
///
/// Varanasi and Wayanad are GEN seats and Amethi an SC seat. Thrissur has no type.
pub(crate) fn get_test_rows() -> Vec<Candidacy> {
    vec![
        Candidacy::new(2019, UTTAR_PRADESH, VARANASI, ALPHA, "Asha Rao", 500)
            .with_electors(1000)
            .with_type(GEN),
        Candidacy::new(2019, UTTAR_PRADESH, VARANASI, BETA, "Bala Singh", 300)
            .with_electors(1000)
            .with_type(GEN),
        Candidacy::new(2019, UTTAR_PRADESH, VARANASI, GAMMA, "Chandra Pal", 100)
            .with_electors(1000)
            .with_type(GEN),
        Candidacy::new(2019, UTTAR_PRADESH, AMETHI, ALPHA, "Deepa Verma", 350)
            .with_electors(1000)
            .with_type(SC),
        Candidacy::new(2019, UTTAR_PRADESH, AMETHI, BETA, "Esha Gupta", 400)
            .with_electors(1000)
            .with_type(SC),
        Candidacy::new(2019, KERALA, WAYANAD, ALPHA, "Farah Khan", 200)
            .with_electors(800)
            .with_type(GEN),
        Candidacy::new(2019, KERALA, WAYANAD, GAMMA, "Gopal Menon", 200)
            .with_electors(800)
            .with_type(GEN),
        Candidacy::new(2024, UTTAR_PRADESH, VARANASI, BETA, "Bala Singh", 600)
            .with_electors(1200)
            .with_type(GEN),
        Candidacy::new(2024, UTTAR_PRADESH, VARANASI, ALPHA, "Asha Rao", 550)
            .with_electors(1200)
            .with_type(GEN),
        Candidacy::new(2024, UTTAR_PRADESH, AMETHI, BETA, "Esha Gupta", 450).with_type(SC),
        Candidacy::new(2024, UTTAR_PRADESH, AMETHI, GAMMA, "Hari Das", 50).with_type(SC),
        Candidacy::new(2024, KERALA, WAYANAD, GAMMA, "Gopal Menon", 300)
            .with_electors(500)
            .with_type(GEN),
        Candidacy::new(2024, KERALA, WAYANAD, ALPHA, "Farah Khan", 100)
            .with_electors(500)
            .with_type(GEN),
        Candidacy::new(2024, KERALA, THRISSUR, ALPHA, "Jaya Das", 700).with_electors(1000),
    ]
}

/// Snapshot built from [get_test_rows].
pub(crate) fn get_test_data() -> ElectionData {
    ElectionData::new(get_test_rows())
}
