use std::collections::HashSet;

use approx;
use nalgebra::Vector3;

use crate::auxiliary::misc::calculate_hash;
use crate::crystal::template_crystals::tetragonal;
use crate::representations::{
    disp, moving_atom_path, DefectState, Dumbbell, IllegalOperationError, Jump, SdPair,
};

fn or_z() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, 1.0)
}

fn or_yz() -> Vector3<f64> {
    Vector3::new(0.0, 1.0, 1.0).normalize()
}

fn or_xz() -> Vector3<f64> {
    Vector3::new(1.0, 0.0, 1.0).normalize()
}

fn or_x() -> Vector3<f64> {
    Vector3::new(1.0, 0.0, 0.0)
}

#[test]
fn test_representations_dumbbell_equality() {
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 0, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(1, 0, 0));
    let db3 = Dumbbell::new(0, or_yz() + Vector3::new(1e-12, 0.0, 0.0), Vector3::new(1, 0, 0));
    assert_eq!(db2, db3);
    assert_eq!(calculate_hash(&db2), calculate_hash(&db3));
    assert_ne!(db1, db3);

    // Reversing the orientation gives a different state object...
    assert_ne!(db1, -&db1);
    // ...which is the same physical jump endpoint once the indicator is flipped too.
    assert_eq!(db1.endpoint_key(1), (-&db1).endpoint_key(-1));
    assert_ne!(db1.endpoint_key(1), db1.endpoint_key(-1));
}

#[test]
fn test_representations_dumbbell_gop() {
    let crys = tetragonal(1.0, 1.5).unwrap();
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(1, 0, 0));
    let images = crys
        .group()
        .iter()
        .map(|g| {
            let db = db1.gop(&crys, 0, g).unwrap();
            if db.o[2] < 0.0 {
                -db
            } else {
                db
            }
        })
        .collect::<HashSet<_>>();
    // Four equivalent cells around the fourfold axis, orientation up to sign.
    assert_eq!(images.len(), 4);
}

#[test]
fn test_representations_sdpair_equality() {
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 0, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(1, 0, 0));
    let pair1 = SdPair::new(0, Vector3::new(1, 0, 0), db1.clone());
    let pair2 = SdPair::new(0, Vector3::new(1, 0, 0), db2.clone());
    let pair3 = SdPair::new(0, Vector3::new(1, 0, 0), db2);
    assert_eq!(pair2, pair3);
    assert_ne!(pair1, pair3);
    assert!(!pair1.is_mixed());
    assert!(pair1.is_gauge_free());

    let mixed = SdPair::new(0, Vector3::zeros(), db1);
    assert!(mixed.is_mixed());
    assert!(!mixed.is_gauge_free());
    assert_eq!(mixed, SdPair::mixed(0, or_z()));
    // A mixed dumbbell keeps its indicator in its key.
    assert_ne!(mixed.endpoint_key(1), (-&mixed).endpoint_key(-1));
}

#[test]
fn test_representations_sdpair_gop() {
    let crys = tetragonal(1.0, 1.5).unwrap();
    let canonical = |p: SdPair| {
        if p.db.o.iter().sum::<f64>() < 0.0 {
            -p
        } else {
            p
        }
    };

    let pair1 = SdPair::new(0, Vector3::new(1, 0, 0), Dumbbell::new(0, or_z(), Vector3::zeros()));
    let images1 = crys
        .group()
        .iter()
        .map(|g| canonical(pair1.gop(&crys, 0, g).unwrap()))
        .collect::<HashSet<_>>();
    assert_eq!(images1.len(), 4);

    let pair2 = SdPair::new(0, Vector3::zeros(), Dumbbell::new(0, or_x(), Vector3::new(0, 0, 1)));
    let images2 = crys
        .group()
        .iter()
        .map(|g| canonical(pair2.gop(&crys, 0, g).unwrap()))
        .collect::<HashSet<_>>();
    // Two cells along the fourfold axis, each with an x- and a y-oriented dumbbell.
    assert_eq!(images2.len(), 4);
}

#[test]
fn test_representations_sdpair_add_dumbbell_jump() {
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 0, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(1, 0, 0));

    // Mixed dumbbell, solute is the moving atom.
    let pair1 = SdPair::new(0, Vector3::zeros(), db1.clone());
    let j1 = Jump::new(db1.clone(), db2.clone(), 1, 1).unwrap();
    let pair2_right = SdPair::new(0, Vector3::new(1, 0, 0), db2.clone());
    let pair2_wrong = SdPair::new(0, Vector3::zeros(), db2.clone());
    assert_eq!((&pair1 + &j1).unwrap(), pair2_right);
    assert_ne!((&pair1 + &j1).unwrap(), pair2_wrong);
    let err = (&pair2_right + &j1).unwrap_err();
    assert!(err.downcast_ref::<IllegalOperationError>().is_some());

    // Mixed dumbbell, solvent is the moving atom: the solute stays behind.
    let j1n = Jump::new(db1.clone(), db2.clone(), -1, 1).unwrap();
    assert_eq!((&pair1 + &j1n).unwrap(), pair2_wrong);
    assert!(!(&pair1 + &j1n).unwrap().is_mixed());

    // Solute landing at the other end of the destination dumbbell flips the mixed orientation.
    let j1m = Jump::new(db1.clone(), db2.clone(), 1, -1).unwrap();
    let landed = (&pair1 + &j1m).unwrap();
    assert!(landed.is_mixed());
    assert_eq!(landed.db, -&db2);

    // The mixed orientation is the reverse of the jump's initial dumbbell.
    let pair1_flipped = SdPair::new(0, Vector3::zeros(), -&db1);
    assert_eq!((&pair1_flipped + &j1n).unwrap(), pair2_right);

    // Isolated dumbbell jumping next to the solute.
    let pair3 = SdPair::new(0, Vector3::new(0, 0, 1), db1);
    let pair4 = SdPair::new(0, Vector3::new(0, 0, 1), db2);
    assert_eq!((&pair3 + &j1).unwrap(), pair4);
    assert!(!pair4.is_mixed());
}

#[test]
fn test_representations_jump_addition() {
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 1, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(0, 0, 0));
    let db3 = Dumbbell::new(0, or_xz(), Vector3::new(0, 0, 1));

    let j1 = Jump::new(db1.clone(), db2.clone(), 1, 1).unwrap();
    let j2 = Jump::new(db2.clone(), db3.clone(), 1, -1).unwrap();
    let j3 = Jump::new(db1.clone(), db3.clone(), 1, -1).unwrap();

    let err = (&j3 + &j1).unwrap_err();
    assert!(err.downcast_ref::<IllegalOperationError>().is_some());
    assert_eq!((&j1 + &j2).unwrap(), j3);

    let err = (&db2 + &j1).unwrap_err();
    assert!(err.downcast_ref::<IllegalOperationError>().is_some());
    assert_eq!((&db1 + &j1).unwrap(), db2);
    // A reversed state still matches, and the destination is reported in the reversed gauge.
    assert_eq!((&(-&db1) + &j1).unwrap(), -&db2);

    // Chaining through a gauge-flipped intermediate state.
    let j2_flipped = Jump::new(-&db2, db3.clone(), -1, -1).unwrap();
    let chained = (&j1 + &j2_flipped).unwrap();
    assert_eq!(chained.state1, db1);
    assert_eq!(chained.state2, -&db3);
    assert_eq!(chained, Jump::new(db1, db3, 1, -1).unwrap());
}

#[test]
fn test_representations_jump_gauge_equality() {
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 1, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(0, 0, 0));
    let j = Jump::new(db1.clone(), db2.clone(), 1, -1).unwrap();
    let j_gauge = Jump::new(-&db1, -&db2, -1, 1).unwrap();
    let j_other = Jump::new(db1.clone(), db2.clone(), -1, -1).unwrap();
    assert_eq!(j, j_gauge);
    assert_eq!(calculate_hash(&j), calculate_hash(&j_gauge));
    assert_ne!(j, j_other);

    let set = [j.clone(), j_gauge, j_other].into_iter().collect::<HashSet<_>>();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_representations_jump_negation_round_trip() {
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 1, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(0, 0, 0));
    let j = Jump::new(db1.clone(), db2.clone(), -1, 1).unwrap();
    let jneg = -&j;

    assert_eq!(jneg, j.reversed());
    assert_eq!(-&jneg, j);

    let there = (&db1 + &j).unwrap();
    assert_eq!(there, db2);
    let back = (&there + &jneg).unwrap();
    assert_eq!(back, db1);

    let loop_jump = (&j + &jneg).unwrap();
    assert_eq!((&db1 + &loop_jump).unwrap(), db1);

    // Mixed dumbbells have no gauge freedom: negation only swaps the endpoints.
    let p1 = SdPair::mixed(0, or_z());
    let p2 = SdPair::new(0, Vector3::new(1, 0, 0), Dumbbell::new(0, or_z(), Vector3::new(1, 0, 0)));
    let jm = Jump::new(p1.clone(), p2.clone(), 1, 1).unwrap();
    let jm_neg = -&jm;
    assert_eq!(jm_neg.state1, p2);
    assert_eq!(jm_neg.state2, p1);
    assert_eq!((jm_neg.c1, jm_neg.c2), (1, 1));
    assert_eq!((&(&p1 + &jm).unwrap() + &jm_neg).unwrap(), p1);
}

#[test]
fn test_representations_jump_gop() {
    let crys = tetragonal(1.0, 1.5).unwrap();
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 1, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(0, 0, 0));
    let j = Jump::new(db1, db2, 1, 1).unwrap();
    let images = crys
        .group()
        .iter()
        .map(|g| j.gop(&crys, 0, g).unwrap())
        .collect::<HashSet<_>>();
    // Only the identity and the mirror x → -x leave this jump invariant.
    assert_eq!(images.len(), 8);
    for jimg in images.iter() {
        approx::assert_relative_eq!(
            jimg.displacement(&crys, 0).unwrap().norm(),
            j.displacement(&crys, 0).unwrap().norm(),
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_representations_displacement_and_path() {
    let crys = tetragonal(1.0, 1.5).unwrap();
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 1, 0));
    let db2 = Dumbbell::new(0, or_z(), Vector3::new(0, 0, 1));
    let dx = disp(&crys, 0, &db1, &db2).unwrap();
    approx::assert_relative_eq!(dx, Vector3::new(0.0, -1.0, 1.5));

    let j = Jump::new(db1, db2, -1, 1).unwrap();
    let (start, end) = moving_atom_path(&crys, 0, &j).unwrap();
    approx::assert_relative_eq!(start, Vector3::new(0.0, 1.0, -0.5));
    approx::assert_relative_eq!(end, Vector3::new(0.0, 0.0, 2.0));
}

#[test]
fn test_representations_jump_rejects_degenerate_endpoints() {
    let db1 = Dumbbell::new(0, or_z(), Vector3::new(0, 1, 0));
    let db2 = Dumbbell::new(0, or_yz(), Vector3::new(0, 0, 0));

    let err = Jump::new(db1.clone(), db1.clone(), 1, -1).unwrap_err();
    assert!(err.downcast_ref::<IllegalOperationError>().is_some());
    assert!(Jump::new(db1.clone(), db2.clone(), 0, 1).is_err());
    assert!(Jump::new(db1.clone(), db2.clone(), 1, 2).is_err());

    // Chaining a jump with its own reverse would return to the start.
    let j = Jump::new(db1, db2, 1, 1).unwrap();
    assert!((&j + &j.reversed()).is_err());
}
