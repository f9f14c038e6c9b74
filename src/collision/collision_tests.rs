use nalgebra::Vector3;

use crate::collision::{collision_others, collision_self, ClosestDistance};
use crate::crystal::template_crystals::{simple_cubic, tetragonal_two_sublattices};
use crate::representations::{Dumbbell, Jump};

fn ox() -> Vector3<f64> {
    Vector3::new(0.126, 0.0, 0.0)
}

#[test]
fn test_collision_self_side_jump_is_clear() {
    let crys = simple_cubic(0.28).unwrap();
    let j = Jump::new(
        Dumbbell::new(0, ox(), Vector3::zeros()),
        Dumbbell::new(0, ox(), Vector3::new(0, 1, 0)),
        -1,
        -1,
    )
    .unwrap();
    assert!(!collision_self(&crys, 0, &j, 0.01, 0.01).unwrap());
    assert!(!collision_others(&crys, 0, &j, &ClosestDistance::Uniform(0.01)).unwrap());

    // The moving atom passes its old partner at a distance of |o|.
    assert!(collision_self(&crys, 0, &j, 0.13, 0.01).unwrap());
}

#[test]
fn test_collision_self_head_on_jump() {
    let crys = simple_cubic(0.28).unwrap();
    // Moving along the dumbbell axis runs straight through the partner at the destination.
    let j = Jump::new(
        Dumbbell::new(0, ox(), Vector3::zeros()),
        Dumbbell::new(0, ox(), Vector3::new(1, 0, 0)),
        1,
        1,
    )
    .unwrap();
    assert!(collision_self(&crys, 0, &j, 0.01, 0.01).unwrap());
    assert!(!collision_self(&crys, 0, &j, 0.01, 0.0).unwrap());
}

#[test]
fn test_collision_others_skips_own_sites() {
    let crys = simple_cubic(0.28).unwrap();
    let rotation = Jump::new(
        Dumbbell::new(0, ox(), Vector3::zeros()),
        Dumbbell::new(0, Vector3::new(0.0, 0.126, 0.0), Vector3::zeros()),
        1,
        1,
    )
    .unwrap();
    assert!(!collision_others(&crys, 0, &rotation, &ClosestDistance::Uniform(0.1)).unwrap());

    // A second-neighbour jump along x passes straight through the intermediate site.
    let long = Jump::new(
        Dumbbell::new(0, ox(), Vector3::zeros()),
        Dumbbell::new(0, ox(), Vector3::new(2, 0, 0)),
        1,
        -1,
    )
    .unwrap();
    assert!(collision_others(&crys, 0, &long, &ClosestDistance::Uniform(0.01)).unwrap());
    assert!(!collision_others(&crys, 0, &long, &ClosestDistance::Uniform(0.0)).unwrap());
}

#[test]
fn test_collision_others_per_sublattice() {
    let crys = tetragonal_two_sublattices(1.0, 1.5).unwrap();
    // The moving atom passes through the body centre, which belongs to the second sublattice.
    let j = Jump::new(
        Dumbbell::new(0, Vector3::new(0.0, 0.0, 0.2), Vector3::zeros()),
        Dumbbell::new(0, Vector3::new(0.0, 0.0, 0.2), Vector3::new(1, 1, 1)),
        1,
        -1,
    )
    .unwrap();
    assert!(
        collision_others(&crys, 0, &j, &ClosestDistance::PerSublattice(vec![0.0, 0.1])).unwrap()
    );
    assert!(
        !collision_others(&crys, 0, &j, &ClosestDistance::PerSublattice(vec![0.1, 0.0])).unwrap()
    );
    assert!(collision_others(&crys, 0, &j, &ClosestDistance::PerSublattice(vec![0.1])).is_err());
    assert!(collision_others(&crys, 0, &j, &ClosestDistance::Uniform(-0.1)).is_err());
}

#[test]
fn test_collision_closest_distance_resolve() {
    let crys = tetragonal_two_sublattices(1.0, 1.5).unwrap();
    assert_eq!(
        ClosestDistance::Uniform(0.2).resolve(&crys).unwrap(),
        vec![0.2, 0.2]
    );
    assert_eq!(
        ClosestDistance::PerSublattice(vec![0.1, 0.3])
            .resolve(&crys)
            .unwrap(),
        vec![0.1, 0.3]
    );
    assert!(ClosestDistance::PerSublattice(vec![0.1, 0.2, 0.3])
        .resolve(&crys)
        .is_err());
}

#[test]
fn test_collision_closest_distance_from_yaml() {
    let uniform: ClosestDistance = serde_yaml::from_str("0.05").unwrap();
    assert_eq!(uniform, ClosestDistance::Uniform(0.05));
    let per_sublattice: ClosestDistance = serde_yaml::from_str("[0.0, 0.1]").unwrap();
    assert_eq!(per_sublattice, ClosestDistance::PerSublattice(vec![0.0, 0.1]));
    assert!(serde_yaml::from_str::<ClosestDistance>("Uniform: 0.05").is_err());

    let written = serde_yaml::to_string(&ClosestDistance::PerSublattice(vec![0.2])).unwrap();
    assert_eq!(
        serde_yaml::from_str::<ClosestDistance>(&written).unwrap(),
        ClosestDistance::PerSublattice(vec![0.2])
    );
}
