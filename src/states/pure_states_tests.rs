use approx;
use itertools::Itertools;
use nalgebra::Vector3;

use crate::crystal::template_crystals::{diamond, simple_cubic, tetragonal_split_sites};
use crate::representations::{DefectState, Dumbbell};
use crate::states::{DumbbellContainer, OrientationFamily, PureDumbbellStates};

fn check_partition_and_closure(states: &PureDumbbellStates) {
    let n = states.iorlist().len();
    assert_eq!(
        states.symorlist().iter().map(|orbit| orbit.len()).sum::<usize>(),
        n
    );
    assert_eq!(
        states
            .indexed_symorlist()
            .iter()
            .flatten()
            .cloned()
            .sorted()
            .collect_vec(),
        (0..n).collect_vec()
    );
    for gi in 0..states.crystal().group().len() {
        let perm = states.index_map(gi).unwrap();
        assert_eq!(perm.iter().unique().count(), n);
        for (idx, &img) in perm.iter().enumerate() {
            assert_eq!(states.orbit_of(idx), states.orbit_of(img));
        }
    }
    for (k, orbit) in states.indexed_symorlist().iter().enumerate() {
        for &idx in orbit.iter() {
            assert_eq!(states.orbit_of(idx), Some(k));
        }
    }
}

#[test]
fn test_pure_states_cubic() {
    let crys = simple_cubic(0.28).unwrap();
    let family = OrientationFamily::new(vec![vec![Vector3::new(0.126, 0.0, 0.0)]]).unwrap();
    let pdb = PureDumbbellStates::new(&crys, 0, family).unwrap();

    assert_eq!(pdb.iorlist().len(), 3);
    assert_eq!(pdb.symorlist().len(), 1);
    assert_eq!(pdb.symorlist()[0].len(), 3);
    check_partition_and_closure(&pdb);

    assert_eq!(pdb.index_of(0, &Vector3::new(0.126, 0.0, 0.0)), Some(0));
    assert_eq!(
        pdb.canonical_index(0, &Vector3::new(-0.126, 0.0, 0.0)),
        Some((0, -1))
    );
    // Each axis appears with exactly one sign.
    for (_, o) in pdb.iorlist() {
        assert!(pdb.index_of(0, &-o).is_none());
    }
    // The identity maps every entry onto itself.
    assert_eq!(pdb.index_map(0).unwrap(), &[0, 1, 2]);
}

#[test]
fn test_pure_states_apply_group_op() {
    let crys = simple_cubic(0.28).unwrap();
    let family = OrientationFamily::new(vec![vec![Vector3::new(0.126, 0.0, 0.0)]]).unwrap();
    let pdb = PureDumbbellStates::new(&crys, 0, family).unwrap();
    let db = Dumbbell::new(0, Vector3::new(0.126, 0.0, 0.0), Vector3::new(1, -1, 0));
    let mut n_flipped = 0;
    for g in crys.group() {
        let raw = db.gop(&crys, 0, g).unwrap();
        let (dbnew, mult) = pdb.apply_group_op(g, &db).unwrap();
        assert_eq!(dbnew.r, raw.r);
        approx::assert_relative_eq!(dbnew.o, raw.o * f64::from(mult));
        assert!(pdb.index_of(dbnew.i, &dbnew.o).is_some());
        if mult == -1 {
            n_flipped += 1;
        }
    }
    // Half of the cubic operations reverse the x axis.
    assert_eq!(n_flipped, 24);

    let stray = Dumbbell::new(0, Vector3::new(0.1, 0.1, 0.0), Vector3::zeros());
    assert!(pdb.apply_group_op(&crys.group()[0], &stray).is_err());
}

#[test]
fn test_pure_states_split_sites() {
    let crys = tetragonal_split_sites(1.0, 1.5).unwrap();
    let family = OrientationFamily::new(vec![
        vec![Vector3::new(1.0, 1.0, 0.0), Vector3::new(1.0, 0.0, 0.0)],
        vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(1.0, 1.0, 0.0)],
    ])
    .unwrap();
    let pdb = PureDumbbellStates::new(&crys, 0, family).unwrap();

    assert_eq!(pdb.iorlist().len(), 16);
    assert_eq!(
        pdb.symorlist().iter().map(|orbit| orbit.len()).collect_vec(),
        vec![2, 2, 8, 4]
    );
    check_partition_and_closure(&pdb);

    // Orbits are headed by the entry they were grown from.
    for (orbit, indexed) in pdb.symorlist().iter().zip(pdb.indexed_symorlist().iter()) {
        let (site, o) = orbit[0];
        assert_eq!(pdb.index_of(site, &o), Some(indexed[0]));
    }
    // Every entry of the second Wyckoff set lives on one of its two sites.
    assert!(pdb.symorlist()[2]
        .iter()
        .chain(pdb.symorlist()[3].iter())
        .all(|(site, _)| *site == 1 || *site == 2));
}

#[test]
fn test_pure_states_diamond() {
    let crys = diamond(0.55).unwrap();
    let family = OrientationFamily::new(vec![vec![Vector3::new(1.0, 1.0, 0.0)]]).unwrap();
    let pdb = PureDumbbellStates::new(&crys, 0, family).unwrap();
    assert_eq!(pdb.iorlist().len(), 12);
    assert_eq!(pdb.symorlist().len(), 1);
    check_partition_and_closure(&pdb);
    assert_eq!(pdb.iorlist().iter().filter(|(site, _)| *site == 0).count(), 6);
}
