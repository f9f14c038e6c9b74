use std::collections::HashSet;

use approx;
use itertools::Itertools;
use nalgebra::Vector3;

use crate::crystal::template_crystals::simple_cubic;
use crate::crystal::Crystal;
use crate::jumpnet::JumpNetworkParams;
use crate::representations::{DefectState, Dumbbell, SdPair};
use crate::stars::StarSet;
use crate::states::{
    DumbbellContainer, MixedDumbbellStates, OrientationFamily, PureDumbbellStates,
};

fn params() -> JumpNetworkParams {
    JumpNetworkParams::builder()
        .cutoff(0.3)
        .solv_solv_cut(0.01)
        .solt_solv_cut(0.01)
        .build()
        .unwrap()
}

fn cubic_starset(crys: &Crystal, nshells: usize) -> StarSet {
    let family = OrientationFamily::new(vec![vec![Vector3::new(0.126, 0.0, 0.0)]]).unwrap();
    let pdb = PureDumbbellStates::new(crys, 0, family.clone()).unwrap();
    let mdb = MixedDumbbellStates::new(crys, 0, family).unwrap();
    let jnet0 = pdb.jumpnetwork(&params()).unwrap();
    let jnet2 = mdb.jumpnetwork(&params()).unwrap();
    StarSet::new(pdb, mdb, jnet0, jnet2, nshells).unwrap()
}

#[test]
fn test_stars_cubic_first_shell() {
    let crys = simple_cubic(0.28).unwrap();
    let starset = cubic_starset(&crys, 1);

    assert_eq!(starset.complex_states().len(), 18);
    assert_eq!(starset.mixed_states().len(), 6);
    assert_eq!(starset.mixedstartindex(), 2);
    assert_eq!(starset.stars().len(), 3);
    assert_eq!(
        starset.stars()[..2]
            .iter()
            .map(|star| star.len())
            .sorted()
            .collect_vec(),
        vec![6, 12]
    );
    assert_eq!(starset.stars()[2].len(), 6);

    for pair in starset.complex_states() {
        assert!(!pair.is_mixed());
        assert_eq!(pair.r_s, Vector3::zeros());
        approx::assert_relative_eq!(pair.position(&crys, 0).unwrap().norm(), 0.28);
    }
    for pair in starset.mixed_states() {
        assert!(pair.is_mixed());
    }
}

#[test]
fn test_stars_partition_and_closure() {
    let crys = simple_cubic(0.28).unwrap();
    let starset = cubic_starset(&crys, 2);
    assert!(starset.complex_states().len() > 18);

    let n = starset.states().len();
    assert_eq!(
        starset.stars().iter().flatten().cloned().sorted().collect_vec(),
        (0..n).collect_vec()
    );
    for (k, star) in starset.stars().iter().enumerate() {
        let mixed = k >= starset.mixedstartindex();
        for &idx in star.iter() {
            assert_eq!(starset.star_of(idx), Some(k));
            assert_eq!(idx >= starset.mixedstateindex(), mixed);
            for g in crys.group() {
                let (image, _) = starset.apply_group_op(g, &starset.states()[idx]).unwrap();
                let image_idx = starset.state_index(&image).unwrap();
                assert_eq!(starset.star_of(image_idx), Some(k));
            }
        }
    }
}

#[test]
fn test_stars_state_index_accepts_reversed_dumbbells() {
    let crys = simple_cubic(0.28).unwrap();
    let starset = cubic_starset(&crys, 1);
    let pair = starset.complex_states()[0].clone();
    let idx = starset.state_index(&pair).unwrap();
    assert_eq!(starset.state_index(&-&pair), Some(idx));

    let mixed = starset.mixed_states()[0].clone();
    assert!(starset.state_index(&mixed).is_some());
    // Reversing a mixed dumbbell moves the solute, so it is another state.
    assert_ne!(starset.state_index(&-&mixed), starset.state_index(&mixed));

    let far = SdPair::new(
        0,
        Vector3::zeros(),
        Dumbbell::new(0, Vector3::new(0.126, 0.0, 0.0), Vector3::new(5, 0, 0)),
    );
    assert_eq!(starset.state_index(&far), None);
}

#[test]
fn test_stars_omega1() {
    let crys = simple_cubic(0.28).unwrap();
    let starset = cubic_starset(&crys, 2);
    let ((jnet1, indexed1), jumptype) = starset.jumpnetwork_omega1().unwrap();
    assert!(!jnet1.is_empty());
    assert_eq!(jnet1.len(), jumptype.len());
    assert_eq!(jnet1.len(), indexed1.len());

    let jnet0 = &starset.jnet0().0;
    let n_jumps = jnet1.iter().map(|orbit| orbit.len()).sum::<usize>();
    let distinct = jnet1.iter().flatten().cloned().collect::<HashSet<_>>();
    assert_eq!(distinct.len(), n_jumps);

    for ((orbit, indexed_orbit), &jt) in jnet1.iter().zip(indexed1.iter()).zip(jumptype.iter()) {
        let members = orbit.iter().cloned().collect::<HashSet<_>>();
        let length0 = jnet0[jt][0].displacement(&crys, 0).unwrap().norm();
        for (jump, ((i1, i2), dx)) in orbit.iter().zip(indexed_orbit.iter()) {
            assert!(!jump.state1.is_mixed());
            assert!(!jump.state2.is_mixed());
            assert_eq!(jump.state1.i_s, jump.state2.i_s);
            assert_eq!(jump.state1.r_s, jump.state2.r_s);
            assert_eq!(starset.states()[*i1], jump.state1);
            assert_eq!(starset.states()[*i2], jump.state2);
            approx::assert_relative_eq!(dx.norm(), length0, epsilon = 1e-10);
            assert!(members.contains(&jump.reversed()));
        }
    }
}

#[test]
fn test_stars_omega34() {
    let crys = simple_cubic(0.28).unwrap();
    let starset = cubic_starset(&crys, 1);
    let networks = starset.jumpnetwork_omega34(&params()).unwrap();
    let (jnet34, indexed34) = &networks.omega34;
    let (jnet4, _) = &networks.omega4;
    let (jnet3, indexed3) = &networks.omega3;
    assert!(!jnet3.is_empty());
    assert_eq!(jnet34.len(), jnet3.len());
    assert_eq!(jnet4.len(), jnet3.len());
    assert_eq!(indexed34.len(), jnet34.len());

    for k in 0..jnet3.len() {
        assert_eq!(jnet34[k].len(), 2 * jnet3[k].len());
        assert_eq!(jnet4[k].len(), jnet3[k].len());
        for (j3, j4) in jnet3[k].iter().zip(jnet4[k].iter()) {
            assert!(j3.state1.is_mixed());
            assert!(!j3.state2.is_mixed());
            assert_eq!(j3.c1, -1);
            assert_eq!(j4.c2, -1);
            assert_eq!(j4.state1, j3.state2);
            assert_eq!(j4.state2, j3.state1);
            assert!(j3.displacement(&crys, 0).unwrap().norm() <= 0.3 + 1e-12);
        }
        for ((i1, i2), _) in indexed3[k].iter() {
            assert!(*i1 >= starset.mixedstateindex());
            assert!(*i2 < starset.mixedstateindex());
        }
    }

    // The solvent atom cannot leave through the solute.
    let blocked = crate::representations::Jump::new(
        SdPair::mixed(0, Vector3::new(0.126, 0.0, 0.0)),
        SdPair::new(
            0,
            Vector3::zeros(),
            Dumbbell::new(0, Vector3::new(0.126, 0.0, 0.0), Vector3::new(1, 0, 0)),
        ),
        -1,
        1,
    )
    .unwrap();
    assert!(!jnet3.iter().flatten().any(|j| *j == blocked));
}

#[test]
fn test_stars_require_matching_containers() {
    let crys = simple_cubic(0.28).unwrap();
    let other = simple_cubic(0.28).unwrap();
    let family = OrientationFamily::new(vec![vec![Vector3::new(0.126, 0.0, 0.0)]]).unwrap();
    let pdb = PureDumbbellStates::new(&crys, 0, family.clone()).unwrap();
    let mdb = MixedDumbbellStates::new(&other, 0, family).unwrap();
    let jnet0 = pdb.jumpnetwork(&params()).unwrap();
    let jnet2 = mdb.jumpnetwork(&params()).unwrap();
    assert!(StarSet::new(pdb, mdb, jnet0, jnet2, 1).is_err());
}

#[test]
fn test_stars_without_shells() {
    let crys = simple_cubic(0.28).unwrap();
    let starset = cubic_starset(&crys, 0);
    assert!(starset.complex_states().is_empty());
    assert_eq!(starset.mixedstartindex(), 0);
    assert_eq!(starset.stars().len(), 1);
    assert_eq!(starset.pdbcontainer().iorlist().len(), 3);
}
