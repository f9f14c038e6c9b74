use env_logger;
use nalgebra::Vector3;

use crate::crystal::template_crystals::{simple_cubic, tetragonal};
use crate::drivers::jump_network::JumpNetworkDriver;
use crate::drivers::DbnetDriver;
use crate::jumpnet::JumpNetworkParams;
use crate::states::OrientationFamily;

fn params(cutoff: f64) -> JumpNetworkParams {
    JumpNetworkParams::builder()
        .cutoff(cutoff)
        .solv_solv_cut(0.01)
        .solt_solv_cut(0.01)
        .build()
        .unwrap()
}

#[test]
fn test_drivers_jump_network_cubic() {
    let _ = env_logger::builder().is_test(true).try_init();
    let crys = simple_cubic(0.28).unwrap();
    let family = OrientationFamily::new(vec![vec![Vector3::new(0.126, 0.0, 0.0)]]).unwrap();
    let params = params(0.3);
    let mut driver = JumpNetworkDriver::builder()
        .parameters(&params)
        .nshells(1)
        .crystal(&crys)
        .pure_family(&family)
        .build()
        .unwrap();
    assert!(driver.result().is_err());
    driver.run().unwrap();
    let res = driver.result().unwrap();

    assert_eq!(res.starset.complex_states().len(), 18);
    assert_eq!(res.starset.mixed_states().len(), 6);
    assert_eq!(res.nvstars, 3);
    assert_eq!(res.nvstars_pure, 2);
    assert_eq!(res.jumptype.len(), res.omega1.0.len());
    assert_eq!(res.biases.bias1.solvent.dim(), (2, res.omega1.0.len()));
    assert_eq!(res.biases.bias2.solute.dim(), (1, res.starset.jnet2().0.len()));
    assert_eq!(res.rates.rate3.dim().0, 1);
    assert_eq!(res.bare.1.dim(), (3, 3, res.omega1.0.len()));

    let report = res.to_string();
    assert!(report.contains("Star set"));
    assert!(report.contains("Vector stars: 3"));
}

#[test]
fn test_drivers_jump_network_separate_omega34_parameters() {
    let crys = tetragonal(0.28, 0.32).unwrap();
    let family = OrientationFamily::new(vec![vec![
        Vector3::new(0.126, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 0.126),
    ]])
    .unwrap();
    let params = params(0.3);
    let omega34_params = params_blocking_all();
    let mut driver = JumpNetworkDriver::builder()
        .parameters(&params)
        .omega34_parameters(Some(&omega34_params))
        .nshells(1)
        .crystal(&crys)
        .pure_family(&family)
        .mixed_family(Some(&family))
        .build()
        .unwrap();
    driver.run().unwrap();
    let res = driver.result().unwrap();
    assert!(res.omega34.omega3.0.is_empty());
    assert_eq!(res.biases.bias3.solvent.dim().1, 0);
    assert_eq!(res.rates.rate4.dim().2, 0);
}

/// A cutoff too short for any mixed dumbbell to dissociate.
fn params_blocking_all() -> JumpNetworkParams {
    params(1.0e-3)
}

#[test]
fn test_drivers_jump_network_rejects_bad_parameters() {
    let crys = simple_cubic(0.28).unwrap();
    let family = OrientationFamily::new(vec![vec![Vector3::new(0.126, 0.0, 0.0)]]).unwrap();
    let params = JumpNetworkParams::builder().cutoff(-1.0).build().unwrap();
    let mut driver = JumpNetworkDriver::builder()
        .parameters(&params)
        .nshells(1)
        .crystal(&crys)
        .pure_family(&family)
        .build()
        .unwrap();
    assert!(driver.run().is_err());
    assert!(driver.result().is_err());
}
