//! Property tests over the solver invariants.

use proptest::prelude::*;
use sign_core::calculations::baseplate::{AnchorPattern, BaseplateLoads, PlateGeometry};
use sign_core::calculations::{
    BasePlateInput, Cabinet, CabinetGeometry, FoundationInput, LoadInput, SelectionPreferences, SortKey,
    SupportDemand, SupportInput,
};
use sign_core::sections::SectionCatalog;
use sign_core::site::{Exposure, SiteEnvironmental};
use sign_core::{check_baseplate, derive_loads, select_support, solve_foundation, ConstantsSet, Outcome};

fn baseplate_input() -> impl Strategy<Value = BasePlateInput> {
    (
        4.0f64..12.0,  // column
        4.0f64..16.0,  // plate overhang
        0.5f64..0.95,  // row spacing / length
        0.25f64..2.0,  // thickness
        0.5f64..1.5,   // anchor diameter
        6.0f64..30.0,  // embedment
        0.0f64..120.0, // moment
        0.0f64..20.0,  // shear
        0.0f64..20.0,  // tension
    )
        .prop_map(|(column, overhang, ratio, thickness, diameter, embedment, moment, shear, tension)| {
            let length = column + overhang;
            BasePlateInput {
                plate: PlateGeometry {
                    width_in: length,
                    length_in: length,
                    thickness_in: thickness,
                    fy_ksi: 36.0,
                    column_size_in: column,
                    weld_size_in: 0.3125,
                    electrode_ksi: None,
                },
                anchors: AnchorPattern {
                    diameter_in: diameter,
                    embedment_in: embedment,
                    futa_ksi: 58.0,
                    rows: 2,
                    per_row: 2,
                    row_spacing_in: length * ratio,
                    spacing_in: None,
                },
                loads: BaseplateLoads {
                    tension_kip: tension,
                    shear_kip: shear,
                    moment_kipft: moment,
                    compression_kip: 1.0,
                },
                fc_psi: None,
            }
        })
}

proptest! {
    #[test]
    fn foundation_is_deterministic(moment in 1.0f64..200.0, soil in 100.0f64..4000.0, diameter in 1.0f64..6.0) {
        let constants = ConstantsSet::builtin().unwrap();
        let input = FoundationInput::new(moment, soil, diameter);
        let a = solve_foundation(&input, &constants);
        let b = solve_foundation(&input, &constants);
        prop_assert_eq!(&a.trace.content_sha256, &b.trace.content_sha256);
        prop_assert_eq!(a.confidence, b.confidence);
        prop_assert!(a.verify());
    }

    #[test]
    fn wider_footing_never_deeper(
        moment in 1.0f64..200.0,
        soil in 100.0f64..4000.0,
        narrow in 1.0f64..6.0,
        extra in 0.0f64..4.0,
    ) {
        let constants = ConstantsSet::builtin().unwrap();
        let a = solve_foundation(&FoundationInput::new(moment, soil, narrow), &constants);
        let b = solve_foundation(&FoundationInput::new(moment, soil, narrow + extra), &constants);
        let da = a.result.unwrap().depth_ft;
        let db = b.result.unwrap().depth_ft;
        prop_assert!(da >= db - 1e-12, "d({}) = {} < d({}) = {}", narrow, da, narrow + extra, db);
        prop_assert!(db >= constants.footing.data.embedment.min_depth_ft);
    }

    #[test]
    fn every_selected_section_passes(moment in 0.0f64..400.0, height in 8.0f64..40.0, supports in 1u32..4) {
        let constants = ConstantsSet::builtin().unwrap();
        let input = SupportInput {
            demand: SupportDemand { moment_kipft: moment, shear_kip: None },
            preferences: SelectionPreferences { sort_by: SortKey::Weight, ..SelectionPreferences::default() },
            height_ft: height,
            num_supports: supports,
        };
        let env = select_support(&input, SectionCatalog::builtin(), &constants);
        let selection = env.result.unwrap();

        prop_assert!(selection.options.iter().all(|o| o.passes_strength() && o.passes_deflection()));
        prop_assert!(selection.options.windows(2).all(|w| w[0].weight_plf <= w[1].weight_plf));
        prop_assert_eq!(
            selection.default_selection.as_deref(),
            selection.options.first().map(|o| o.designation.as_str())
        );
        prop_assert_eq!(env.trace.outcome == Outcome::Solved, !selection.options.is_empty());
    }

    #[test]
    fn baseplate_aggregate_matches_checks(input in baseplate_input()) {
        let constants = ConstantsSet::builtin().unwrap();
        let env = check_baseplate(&input, &constants);
        let solution = env.result.unwrap();

        prop_assert_eq!(solution.checks.len(), 6);
        prop_assert_eq!(solution.aggregate_pass, solution.checks.iter().all(|c| c.passed));
        prop_assert_eq!(solution.aggregate_pass, env.trace.outcome == Outcome::Solved);
        prop_assert_eq!(!solution.aggregate_pass, env.trace.request_engineering);
        prop_assert_eq!(solution.aggregate_pass, solution.suggestions.is_empty());
        prop_assert!((0.0..=1.0).contains(&env.confidence));

        let again = check_baseplate(&input, &constants);
        prop_assert_eq!(&env.trace.content_sha256, &again.trace.content_sha256);
    }

    #[test]
    fn load_derivation_is_idempotent(
        overall in 12.0f64..60.0,
        width in 1.0f64..20.0,
        heights in prop::collection::vec(1.0f64..4.0, 1..4),
        wind in 90.0f64..180.0,
    ) {
        let constants = ConstantsSet::builtin().unwrap();
        let input = LoadInput {
            geometry: CabinetGeometry {
                overall_height_ft: overall,
                cabinets: heights.iter().map(|&h| Cabinet::new(width, h, 8.0)).collect(),
            },
            site: SiteEnvironmental::manual(wind, Exposure::B),
        };
        let a = derive_loads(&input, &constants);
        let b = derive_loads(&input, &constants);
        prop_assert!(a.is_solved());
        prop_assert_eq!(&a.trace.content_sha256, &b.trace.content_sha256);
        let (la, lb) = (a.result.unwrap(), b.result.unwrap());
        prop_assert_eq!(la.centroid_height_ft, lb.centroid_height_ft);
        prop_assert_eq!(la.moment_kipft, lb.moment_kipft);
        prop_assert!(la.centroid_height_ft > 0.0 && la.centroid_height_ft < overall);
    }

    #[test]
    fn non_positive_cabinet_dimension_is_invalid(width in -20.0f64..=0.0, height in 1.0f64..10.0) {
        let constants = ConstantsSet::builtin().unwrap();
        let input = LoadInput {
            geometry: CabinetGeometry {
                overall_height_ft: 30.0,
                cabinets: vec![Cabinet::new(width, height, 10.0)],
            },
            site: SiteEnvironmental::manual(115.0, Exposure::C),
        };
        let env = derive_loads(&input, &constants);
        prop_assert_eq!(env.trace.outcome, Outcome::Invalid);
        prop_assert!(env.result.is_none());
        prop_assert_eq!(env.confidence, 0.0);
    }

    #[test]
    fn non_positive_footing_dimension_is_invalid(diameter in -5.0f64..=0.0) {
        let constants = ConstantsSet::builtin().unwrap();
        let env = solve_foundation(&FoundationInput::new(30.0, 1500.0, diameter), &constants);
        prop_assert_eq!(env.trace.outcome, Outcome::Invalid);
        prop_assert!(env.result.is_none());
    }
}
