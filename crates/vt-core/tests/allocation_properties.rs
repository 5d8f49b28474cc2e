//! Property-based tests for allocation invariants.

use proptest::prelude::*;
use vt_config::{CalibrationPreset, ScoringScheme, SimulationConstants, TierScheme};
use vt_core::cohort::generate_cohort;
use vt_core::seed::cohort_rng;
use vt_core::{Cohort, Comorbidity, Patient, Policy};

fn comorbidity_strategy() -> impl Strategy<Value = Comorbidity> {
    prop_oneof![
        Just(Comorbidity::None),
        Just(Comorbidity::Major),
        Just(Comorbidity::Severe),
    ]
}

fn patient_strategy() -> impl Strategy<Value = Patient> {
    (
        20.0f64..100.0,
        3u32..=20,
        comorbidity_strategy(),
        0.0f64..1.0,
        0.0f64..1.0,
        0.0f64..80.0,
    )
        .prop_map(|(age, severity_score, comorbidity, survival_probability, draw, years)| Patient {
            id: 0,
            age,
            age_band: 0,
            comorbidity,
            severity_score,
            survival_probability,
            outcome_draw: draw,
            alive: draw < survival_probability,
            life_years_remaining: years,
        })
}

/// A cohort plus one lottery draw per patient.
fn cohort_strategy() -> impl Strategy<Value = (Cohort, Vec<f64>)> {
    prop::collection::vec((patient_strategy(), 0.0f64..1.0), 1..120).prop_map(|pairs| {
        let (patients, lottery): (Vec<Patient>, Vec<f64>) = pairs.into_iter().unzip();
        (Cohort::from_patients(patients, 1), lottery)
    })
}

fn policy_strategy() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::SickestFirst),
        Just(Policy::Lottery),
        Just(Policy::YoungestFirst),
        Just(Policy::MaximizeSurvival),
        Just(Policy::MaximizeLifeYears),
        Just(Policy::TieredLottery {
            scheme: TierScheme::default()
        }),
        Just(Policy::TieredLottery {
            scheme: TierScheme {
                ineligible_from_tier: None,
                ..TierScheme::default()
            }
        }),
        Just(Policy::ScoredTiebreak {
            scheme: ScoringScheme::default()
        }),
    ]
}

fn eligible_count(policy: &Policy, cohort: &Cohort) -> usize {
    cohort.iter().filter(|p| policy.is_eligible(p)).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn grants_exactly_min_of_budget_and_eligible(
        (cohort, lottery) in cohort_strategy(),
        policy in policy_strategy(),
        budget in 0usize..150,
    ) {
        let allocation = policy.allocate_with_lottery(&cohort, budget, &lottery).expect("allocate");
        let eligible = eligible_count(&policy, &cohort);
        prop_assert_eq!(allocation.granted_count(), budget.min(eligible));
        prop_assert_eq!(allocation.outcomes.len(), cohort.len());
    }

    #[test]
    fn order_is_a_permutation(
        (cohort, lottery) in cohort_strategy(),
        policy in policy_strategy(),
    ) {
        let mut order = policy.order(&cohort, &lottery).expect("order");
        order.sort_unstable();
        prop_assert_eq!(order, (0..cohort.len()).collect::<Vec<_>>());
    }

    #[test]
    fn fixed_lottery_is_idempotent(
        (cohort, lottery) in cohort_strategy(),
        policy in policy_strategy(),
        budget in 0usize..150,
    ) {
        let first = policy.allocate_with_lottery(&cohort, budget, &lottery).expect("first");
        let second = policy.allocate_with_lottery(&cohort, budget, &lottery).expect("second");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn granted_set_grows_with_budget(
        (cohort, lottery) in cohort_strategy(),
        policy in policy_strategy(),
        budget in 0usize..120,
        extra in 1usize..30,
    ) {
        let smaller = policy.allocate_with_lottery(&cohort, budget, &lottery).expect("k");
        let larger = policy.allocate_with_lottery(&cohort, budget + extra, &lottery).expect("k+");
        for i in smaller.granted_indices() {
            prop_assert!(larger.is_granted(i), "patient {} lost the resource at a larger budget", i);
        }
    }

    #[test]
    fn granted_outcomes_follow_latent_state(
        (cohort, lottery) in cohort_strategy(),
        policy in policy_strategy(),
        budget in 0usize..150,
    ) {
        let allocation = policy.allocate_with_lottery(&cohort, budget, &lottery).expect("allocate");
        let survivors_granted = allocation
            .granted_indices()
            .into_iter()
            .filter(|&i| cohort.patients()[i].alive)
            .count();
        prop_assert_eq!(allocation.lives_saved(), survivors_granted);
    }

    #[test]
    fn default_tiered_scheme_never_serves_score_twelve_or_more(
        (cohort, lottery) in cohort_strategy(),
        budget in 0usize..150,
    ) {
        let policy = Policy::TieredLottery { scheme: TierScheme::default() };
        let allocation = policy.allocate_with_lottery(&cohort, budget, &lottery).expect("allocate");
        for i in allocation.granted_indices() {
            prop_assert!(cohort.patients()[i].severity_score < 12);
        }
    }

    #[test]
    fn evaluation_leaves_cohort_untouched(
        (cohort, lottery) in cohort_strategy(),
        budget in 0usize..150,
    ) {
        let before = cohort.clone();
        for policy in Policy::defaults() {
            policy.allocate_with_lottery(&cohort, budget, &lottery).expect("allocate");
        }
        prop_assert_eq!(before, cohort);
    }
}

#[test]
fn maximize_survival_grants_the_lowest_severity_half() {
    let patients: Vec<Patient> = (0..1000)
        .map(|i| {
            let low = i % 2 == 0;
            let severity_score = if low { 3 + (i % 3) as u32 } else { 10 + (i % 7) as u32 };
            Patient {
                id: 0,
                age: 20.0 + (i % 70) as f64,
                age_band: 0,
                comorbidity: Comorbidity::None,
                severity_score,
                survival_probability: 0.5,
                outcome_draw: if i % 3 == 0 { 0.1 } else { 0.9 },
                alive: i % 3 == 0,
                life_years_remaining: 10.0,
            }
        })
        .collect();
    let cohort = Cohort::from_patients(patients, 1);
    let lottery: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64 / 1000.0).collect();

    let allocation = Policy::MaximizeSurvival
        .allocate_with_lottery(&cohort, 500, &lottery)
        .expect("allocate");

    let low: Vec<usize> = cohort
        .iter()
        .filter(|p| p.severity_score < 10)
        .map(|p| p.id)
        .collect();
    assert_eq!(low.len(), 500);
    assert_eq!(allocation.granted_indices(), low);
    let expected_lives = low.iter().filter(|&&i| cohort.patients()[i].alive).count();
    assert_eq!(allocation.lives_saved(), expected_lives);
}

#[test]
fn alive_flags_identical_across_policies_on_generated_cohort() {
    let preset = CalibrationPreset::Cdc2020;
    let constants = SimulationConstants::default();
    let cohort = generate_cohort(
        &preset.age_table(),
        &preset.severity_table(),
        &constants,
        400,
        &mut cohort_rng(99, 0),
    )
    .expect("generate");
    let alive: Vec<bool> = cohort.iter().map(|p| p.alive).collect();

    for (i, policy) in Policy::defaults().into_iter().enumerate() {
        let mut rng = cohort_rng(1234, i);
        let allocation = policy.allocate(&cohort, 150, &mut rng).expect("allocate");
        for (idx, outcome) in allocation.outcomes.iter().enumerate() {
            if outcome.is_granted() {
                assert_eq!(
                    *outcome == vt_core::AllocationOutcome::GrantedSurvived,
                    alive[idx],
                    "{} patient {}",
                    policy,
                    idx
                );
            }
        }
    }
    assert_eq!(alive, cohort.iter().map(|p| p.alive).collect::<Vec<_>>());
}
