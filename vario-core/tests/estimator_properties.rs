//! Covariance invariants under arbitrary cycle sequences

use proptest::prelude::*;

use vario_core::{
    constants::SYMMETRY_TOLERANCE, AltitudeEstimator, CovarianceForm, ManualTime, TuningParameters,
};

#[derive(Debug, Clone)]
enum Step {
    Predict { dt_ms: u64 },
    Update { dt_ms: u64, measurement: f64 },
    Late { back_ms: u64, measurement: f64 },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u64..5_000).prop_map(|dt_ms| Step::Predict { dt_ms }),
        (0u64..5_000, -500.0f64..500.0)
            .prop_map(|(dt_ms, measurement)| Step::Update { dt_ms, measurement }),
        (1u64..2_000, -500.0f64..500.0)
            .prop_map(|(back_ms, measurement)| Step::Late { back_ms, measurement }),
    ]
}

fn tuning() -> impl Strategy<Value = TuningParameters> {
    (
        0.0f64..0.1,
        0.0f64..0.1,
        0.0001f64..1.0,
        0.0f64..0.5,
        prop::bool::ANY,
    )
        .prop_map(|(qa, qb, r, gate, joseph)| {
            TuningParameters::default()
                .with_process_noise_altitude(qa)
                .with_process_noise_bias(qb)
                .with_measurement_noise(r)
                .with_residual_gate_threshold(gate)
                .with_covariance_form(if joseph {
                    CovarianceForm::Joseph
                } else {
                    CovarianceForm::Simple
                })
        })
}

fn apply(estimator: &mut AltitudeEstimator<ManualTime>, now: &mut u64, step: &Step) {
    match *step {
        Step::Predict { dt_ms } => {
            *now += dt_ms;
            estimator.predict_at(*now);
        }
        Step::Update { dt_ms, measurement } => {
            *now += dt_ms;
            estimator.update_at(measurement, *now).unwrap();
        }
        Step::Late { back_ms, measurement } => {
            estimator
                .update_at(measurement, now.saturating_sub(back_ms))
                .unwrap();
        }
    }
}

proptest! {
    #[test]
    fn covariance_stays_symmetric_and_non_negative(
        tuning in tuning(),
        steps in prop::collection::vec(step(), 1..60),
    ) {
        let mut estimator = AltitudeEstimator::new(tuning, ManualTime::new(0)).unwrap();
        let mut now = 0;

        for step in &steps {
            apply(&mut estimator, &mut now, step);

            let covariance = estimator.covariance();
            prop_assert!(covariance.is_finite());
            prop_assert!(covariance.is_symmetric(SYMMETRY_TOLERANCE));
            for variance in covariance.diagonal() {
                prop_assert!(variance >= 0.0);
            }
        }
    }

    #[test]
    fn last_update_never_decreases(
        steps in prop::collection::vec(step(), 1..60),
    ) {
        let mut estimator = AltitudeEstimator::new(TuningParameters::default(), ManualTime::new(0)).unwrap();
        let mut now = 0;
        let mut previous = 0;

        for step in &steps {
            apply(&mut estimator, &mut now, step);
            let last = estimator.state().last_update.unwrap();
            prop_assert!(last >= previous);
            previous = last;
        }
    }

    #[test]
    fn non_finite_measurements_are_inert(
        steps in prop::collection::vec(step(), 0..20),
        bad in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)],
        at in 0u64..100_000,
    ) {
        let mut estimator = AltitudeEstimator::new(TuningParameters::default(), ManualTime::new(0)).unwrap();
        let mut now = 0;
        for step in &steps {
            apply(&mut estimator, &mut now, step);
        }

        let before = *estimator.state();
        prop_assert!(estimator.update_at(bad, at).is_err());
        prop_assert_eq!(*estimator.state(), before);
    }
}
