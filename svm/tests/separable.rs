use ndarray::{Array2, Axis};

use speakerid_svm::{
    accuracy, train_test_split, ClassifierKind, SplitConfig, StructuredLearner,
    SubgradientSsvm, Xoshiro256ss,
};

const CENTERS: [[f64; 3]; 4] = [
    [4.0, 0.0, 0.0],
    [0.0, 4.0, 0.0],
    [0.0, 0.0, 4.0],
    [-4.0, -4.0, -4.0],
];

fn uniform(rng: &mut Xoshiro256ss) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
}

/// Four well separated blobs with uniform noise in [-1, 1].
fn blobs(per_class: usize, seed: u64) -> (Array2<f64>, Vec<usize>) {
    let mut rng = Xoshiro256ss::new(seed);
    let n = per_class * CENTERS.len();
    let mut x = Array2::zeros((n, 3));
    let mut y = Vec::with_capacity(n);
    for (i, mut row) in x.axis_iter_mut(Axis(0)).enumerate() {
        let class = i % CENTERS.len();
        for (j, v) in row.iter_mut().enumerate() {
            *v = CENTERS[class][j] + uniform(&mut rng);
        }
        y.push(class);
    }
    (x, y)
}

fn with_ones(x: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::ones((x.nrows(), x.ncols() + 1));
    out.slice_mut(ndarray::s![.., ..x.ncols()]).assign(x);
    out
}

#[test]
fn benchmark_variants_separate_blobs() {
    let (x, y) = blobs(50, 3);
    let split = train_test_split(
        x.view(),
        &y,
        &SplitConfig {
            test_size: 0.25,
            seed: Some(11),
        },
    )
    .unwrap();
    assert_eq!(split.y_test.len(), 50);
    assert_eq!(split.y_train.len(), 150);

    for kind in ClassifierKind::ALL {
        if kind == ClassifierKind::Subgradient {
            // its benchmark learning rate is far too small for a unit test
            continue;
        }
        let (train, test) = if kind.needs_bias() {
            (with_ones(&split.x_train), with_ones(&split.x_test))
        } else {
            (split.x_train.clone(), split.x_test.clone())
        };

        let mut clf = kind.build();
        clf.fit(train.view(), &split.y_train).unwrap();
        let pred = clf.predict(test.view()).unwrap();
        assert_eq!(pred.len(), test.nrows());

        let acc = accuracy(&split.y_test, &pred);
        assert!(acc >= 0.95, "{kind}: accuracy {acc}");
        assert_eq!(clf.score(test.view(), &split.y_test).unwrap(), acc);
    }
}

#[test]
fn labels_need_not_be_dense() {
    const LABELS: [usize; 4] = [3, 17, 1_000_000, usize::MAX];
    let (x, y) = blobs(20, 5);
    let y: Vec<usize> = y.into_iter().map(|c| LABELS[c]).collect();
    let biased = with_ones(&x);

    for kind in ClassifierKind::ALL {
        if kind == ClassifierKind::Subgradient {
            continue;
        }
        let data = if kind.needs_bias() { &biased } else { &x };
        let mut clf = kind.build();
        clf.fit(data.view(), &y).unwrap();
        let pred = clf.predict(data.view()).unwrap();
        assert!(pred.iter().all(|p| LABELS.contains(p)), "{kind}: {pred:?}");
        assert!(accuracy(&y, &pred) >= 0.95, "{kind}");
    }

    let mut clf = ClassifierKind::OneSlack.build();
    clf.fit(biased.slice(ndarray::s![..2, ..]), &[0, usize::MAX]).unwrap();
}

#[test]
fn tuned_subgradient_separates_blobs() {
    let (x, y) = blobs(30, 8);
    let x = with_ones(&x);

    let mut svm = SubgradientSsvm::new(1.0, 100, 0.01);
    svm.decay_exponent = 0.0;
    svm.momentum = 0.5;
    StructuredLearner::fit(&mut svm, x.view(), &y).unwrap();

    let pred = StructuredLearner::predict(&svm, x.view()).unwrap();
    assert!(accuracy(&y, &pred) >= 0.95);
    assert_eq!(svm.weights().unwrap().len(), 4 * 4);
}

#[test]
fn classifiers_reject_empty_training_sets() {
    let x = Array2::<f64>::zeros((0, 4));
    for kind in ClassifierKind::ALL {
        let mut clf = kind.build();
        assert!(clf.fit(x.view(), &[]).is_err(), "{kind} accepted no data");
    }
}

#[test]
fn predict_before_fit_is_an_error() {
    let x = Array2::<f64>::zeros((2, 4));
    for kind in ClassifierKind::ALL {
        let clf = kind.build();
        assert!(clf.predict(x.view()).is_err(), "{kind} predicted unfitted");
    }
}
