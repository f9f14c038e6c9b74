//! Orientation-bearing point defects and the transitions between them.
//!
//! A [`Dumbbell`] is a pair of atoms sharing one lattice site, oriented along a Cartesian vector.
//! An [`SdPair`] additionally records where a solute atom sits. A [`Jump`] connects two states
//! of the same kind and records, through its indicators `c1` and `c2`, which end of each dumbbell
//! carries the moving atom: the moving atom sits at $`\mathbf{x} + c\,\mathbf{o}/2`$.
//!
//! For a dumbbell made of two identical atoms, the endpoints $`(\mathbf{o}, c)`$ and
//! $`(-\mathbf{o}, -c)`$ describe the same physical situation. States for which this holds are
//! said to be *gauge-free* and are compared on the folded orientation $`c\,\mathbf{o}`$. A mixed
//! dumbbell, in which the solute shares the site, is not gauge-free: by convention the solute sits
//! at $`+\mathbf{o}/2`$.

use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Neg};

use anyhow;
use duplicate::duplicate_item;
use itertools::Itertools;
use nalgebra::Vector3;

use crate::auxiliary::misc::{round_vector, RoundedVector3};
use crate::crystal::{Crystal, GroupOp};

#[cfg(test)]
#[path = "representations_tests.rs"]
mod representations_tests;

// ==================
// Error definitions
// ==================

/// Error raised when states and jumps are combined in a way that has no physical meaning, such as
/// adding a jump to a state it does not start from.
#[derive(Debug, Clone)]
pub struct IllegalOperationError(pub String);

impl fmt::Display for IllegalOperationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Illegal operation: {}", self.0)
    }
}

impl Error for IllegalOperationError {}

// ==================
// Struct definitions
// ==================

/// A hashable encoding of a state: its integer data followed by its orientation snapped onto the
/// hashing grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    sites: Vec<i64>,
    orientation: RoundedVector3,
}

/// A hashable encoding of one end of a jump. For gauge-free states the indicator is folded into
/// the orientation and recorded as zero.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    state: StateKey,
    indicator: i8,
}

// -------
// Dumbbell
// -------

/// A dumbbell interstitial on basis site `i` of the cell at lattice translation `r`.
#[derive(Clone, Debug)]
pub struct Dumbbell {
    /// The basis site index within the sublattice.
    pub i: usize,

    /// The Cartesian orientation vector joining the two atoms.
    pub o: Vector3<f64>,

    /// The lattice translation of the cell hosting the dumbbell.
    pub r: Vector3<i32>,
}

impl Dumbbell {
    pub fn new(i: usize, o: Vector3<f64>, r: Vector3<i32>) -> Self {
        Self { i, o, r }
    }
}

// ------
// SdPair
// ------

/// A solute atom on site `i_s` of the cell at `r_s`, together with a dumbbell. The pair is a
/// *mixed dumbbell* when the solute shares the dumbbell's site, and a *complex* otherwise.
#[derive(Clone, Debug)]
pub struct SdPair {
    /// The basis site index of the solute.
    pub i_s: usize,

    /// The lattice translation of the cell hosting the solute.
    pub r_s: Vector3<i32>,

    /// The dumbbell.
    pub db: Dumbbell,
}

impl SdPair {
    pub fn new(i_s: usize, r_s: Vector3<i32>, db: Dumbbell) -> Self {
        Self { i_s, r_s, db }
    }

    /// Returns a mixed dumbbell on site `i` at the origin cell with orientation `o`.
    pub fn mixed(i: usize, o: Vector3<f64>) -> Self {
        Self::new(i, Vector3::zeros(), Dumbbell::new(i, o, Vector3::zeros()))
    }

    /// Returns `true` if the solute occupies the dumbbell's site.
    pub fn is_mixed(&self) -> bool {
        self.i_s == self.db.i && self.r_s == self.db.r
    }

    /// Transports this pair along a bare-dumbbell jump.
    ///
    /// The dumbbell must match the jump's initial state, possibly up to a gauge flip. If the pair
    /// is a mixed dumbbell and the moving atom is the solute, the solute travels with the jump
    /// and ends up at the destination end selected by the final indicator. Otherwise the solute
    /// stays put.
    ///
    /// # Arguments
    ///
    /// * `jump` - A jump between bare dumbbells.
    ///
    /// # Returns
    ///
    /// The transported pair, or an [`IllegalOperationError`] if the jump does not start at this
    /// pair's dumbbell.
    pub fn add_dumbbell_jump(&self, jump: &Jump<Dumbbell>) -> Result<SdPair, anyhow::Error> {
        let (c1, c2, db2) = if self.db == jump.state1 {
            (jump.c1, jump.c2, jump.state2.clone())
        } else if self.db.gauge_flipped() == jump.state1 {
            (-jump.c1, -jump.c2, jump.state2.gauge_flipped())
        } else {
            return Err(IllegalOperationError(format!(
                "jump `{jump}` does not start at the dumbbell of pair `{self}`."
            ))
            .into());
        };
        if self.is_mixed() && c1 == 1 {
            let o = db2.o * f64::from(c2);
            Ok(SdPair::new(db2.i, db2.r, Dumbbell::new(db2.i, o, db2.r)))
        } else {
            Ok(SdPair::new(self.i_s, self.r_s, db2))
        }
    }
}

// ----
// Jump
// ----

/// A transition from `state1` to `state2`. The indicators select the end of each dumbbell that
/// carries the moving atom and must be either `+1` or `-1`.
#[derive(Clone, Debug)]
pub struct Jump<S: DefectState> {
    pub state1: S,
    pub state2: S,
    pub c1: i8,
    pub c2: i8,
}

impl<S: DefectState> Jump<S> {
    /// Creates a jump between two distinct states.
    ///
    /// # Errors
    ///
    /// Errors with [`IllegalOperationError`] if the endpoints coincide or if an indicator is not
    /// `±1`.
    pub fn new(state1: S, state2: S, c1: i8, c2: i8) -> Result<Self, anyhow::Error> {
        if c1.abs() != 1 || c2.abs() != 1 {
            return Err(IllegalOperationError(format!(
                "jump indicators must be ±1, got {c1:+} and {c2:+}."
            ))
            .into());
        }
        if state1 == state2 {
            return Err(IllegalOperationError(format!(
                "a jump cannot start and end at `{state1}`."
            ))
            .into());
        }
        Ok(Self::from_endpoints(state1, state2, c1, c2))
    }

    /// Assembles a jump from endpoints already known to be distinct.
    fn from_endpoints(state1: S, state2: S, c1: i8, c2: i8) -> Self {
        Self {
            state1,
            state2,
            c1,
            c2,
        }
    }

    /// Returns the gauge-normalised encoding of the two endpoints.
    pub fn key(&self) -> (EndpointKey, EndpointKey) {
        (
            self.state1.endpoint_key(self.c1),
            self.state2.endpoint_key(self.c2),
        )
    }

    /// Translates both endpoints by the same lattice vector.
    pub fn translated(&self, shift: &Vector3<i32>) -> Self {
        Self::from_endpoints(
            self.state1.translated(shift),
            self.state2.translated(shift),
            self.c1,
            self.c2,
        )
    }

    /// Applies a group operation to both endpoints, leaving the indicators untouched.
    pub fn gop(&self, crys: &Crystal, chem: usize, g: &GroupOp) -> Result<Self, anyhow::Error> {
        Ok(Self::from_endpoints(
            self.state1.gop(crys, chem, g)?,
            self.state2.gop(crys, chem, g)?,
            self.c1,
            self.c2,
        ))
    }

    /// Returns the same physical transition run backwards, expressed in the gauge of the
    /// current endpoints.
    pub fn reversed(&self) -> Self {
        Self::from_endpoints(
            self.state2.clone(),
            self.state1.clone(),
            self.c2,
            self.c1,
        )
    }

    /// Returns the Cartesian displacement of the dumbbell centre.
    pub fn displacement(&self, crys: &Crystal, chem: usize) -> Result<Vector3<f64>, anyhow::Error> {
        disp(crys, chem, &self.state1, &self.state2)
    }
}

// =================
// Trait definitions
// =================

/// Capabilities shared by every defect state that a [`Jump`] can connect.
pub trait DefectState: Clone + fmt::Debug + fmt::Display + PartialEq + Eq + Hash {
    // ----------------
    // Required methods
    // ----------------

    /// Returns the dumbbell carried by this state.
    fn dumbbell(&self) -> &Dumbbell;

    /// Returns the lattice translation that anchors this state: the solute cell for pairs, the
    /// dumbbell cell otherwise.
    fn translation(&self) -> &Vector3<i32>;

    /// Translates the whole state by a lattice vector.
    fn translated(&self, shift: &Vector3<i32>) -> Self;

    /// Applies a space-group operation.
    ///
    /// # Arguments
    ///
    /// * `crys` - The crystal.
    /// * `chem` - The sublattice on which the state lives.
    /// * `g` - The group operation.
    ///
    /// # Returns
    ///
    /// The transformed state, with positions following [`Crystal::g_pos`] and orientations
    /// following [`Crystal::g_direc`].
    fn gop(&self, crys: &Crystal, chem: usize, g: &GroupOp) -> Result<Self, anyhow::Error>;

    /// Reverses the dumbbell orientation.
    fn gauge_flipped(&self) -> Self;

    /// Returns `true` if reversing the orientation together with the jump indicator leaves the
    /// physical state unchanged.
    fn is_gauge_free(&self) -> bool;

    /// Returns the hashable encoding of this state.
    fn state_key(&self) -> StateKey;

    // ----------------
    // Provided methods
    // ----------------

    /// Returns the gauge-normalised encoding of this state used as a jump endpoint with indicator
    /// `c`.
    fn endpoint_key(&self, c: i8) -> EndpointKey {
        if self.is_gauge_free() {
            let state = if c < 0 {
                self.gauge_flipped().state_key()
            } else {
                self.state_key()
            };
            EndpointKey {
                state,
                indicator: 0,
            }
        } else {
            EndpointKey {
                state: self.state_key(),
                indicator: c,
            }
        }
    }

    /// Returns the Cartesian position of the dumbbell centre.
    fn position(&self, crys: &Crystal, chem: usize) -> Result<Vector3<f64>, anyhow::Error> {
        let db = self.dumbbell();
        crys.site_position(chem, db.i, &db.r)
    }

    /// Transports this state along a jump.
    ///
    /// The state must coincide with the jump's initial state. Gauge-free states may also match
    /// through their reversed orientation, in which case the destination is reported in the
    /// reversed gauge too whenever it admits one.
    ///
    /// # Returns
    ///
    /// The destination state, or an [`IllegalOperationError`] if the jump does not start here.
    fn add_jump(&self, jump: &Jump<Self>) -> Result<Self, anyhow::Error> {
        if *self == jump.state1 {
            Ok(jump.state2.clone())
        } else if self.is_gauge_free() && self.gauge_flipped() == jump.state1 {
            Ok(gauge_transform(&jump.state2, jump.c2).0)
        } else {
            Err(IllegalOperationError(format!(
                "jump `{jump}` does not start at state `{self}`."
            ))
            .into())
        }
    }
}

// =====================
// Trait implementations
// =====================

// --------
// Dumbbell
// --------

impl DefectState for Dumbbell {
    fn dumbbell(&self) -> &Dumbbell {
        self
    }

    fn translation(&self) -> &Vector3<i32> {
        &self.r
    }

    fn translated(&self, shift: &Vector3<i32>) -> Self {
        Self::new(self.i, self.o, self.r + shift)
    }

    fn gop(&self, crys: &Crystal, chem: usize, g: &GroupOp) -> Result<Self, anyhow::Error> {
        let (r_new, (_, i_new)) = crys.g_pos(g, &self.r, (chem, self.i))?;
        Ok(Self::new(i_new, crys.g_direc(g, &self.o), r_new))
    }

    fn gauge_flipped(&self) -> Self {
        Self::new(self.i, -self.o, self.r)
    }

    fn is_gauge_free(&self) -> bool {
        true
    }

    fn state_key(&self) -> StateKey {
        StateKey {
            sites: vec![
                self.i as i64,
                i64::from(self.r[0]),
                i64::from(self.r[1]),
                i64::from(self.r[2]),
            ],
            orientation: round_vector(&self.o),
        }
    }
}

impl PartialEq for Dumbbell {
    /// Orientations are snapped onto the hashing grid before being compared so that equality
    /// agrees with hashing.
    fn eq(&self, other: &Self) -> bool {
        self.state_key() == other.state_key()
    }
}

impl Eq for Dumbbell {}

impl Hash for Dumbbell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state_key().hash(state);
    }
}

impl fmt::Display for Dumbbell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "db(site {}, o = ({}), R = ({}))",
            self.i,
            self.o.iter().map(|x| format!("{x:+.4}")).join(", "),
            self.r.iter().join(", ")
        )
    }
}

impl Neg for &Dumbbell {
    type Output = Dumbbell;

    fn neg(self) -> Self::Output {
        self.gauge_flipped()
    }
}

impl Neg for Dumbbell {
    type Output = Dumbbell;

    fn neg(self) -> Self::Output {
        -&self
    }
}

// ------
// SdPair
// ------

impl DefectState for SdPair {
    fn dumbbell(&self) -> &Dumbbell {
        &self.db
    }

    fn translation(&self) -> &Vector3<i32> {
        &self.r_s
    }

    fn translated(&self, shift: &Vector3<i32>) -> Self {
        Self::new(self.i_s, self.r_s + shift, self.db.translated(shift))
    }

    fn gop(&self, crys: &Crystal, chem: usize, g: &GroupOp) -> Result<Self, anyhow::Error> {
        let (r_s_new, (_, i_s_new)) = crys.g_pos(g, &self.r_s, (chem, self.i_s))?;
        Ok(Self::new(i_s_new, r_s_new, self.db.gop(crys, chem, g)?))
    }

    fn gauge_flipped(&self) -> Self {
        Self::new(self.i_s, self.r_s, self.db.gauge_flipped())
    }

    fn is_gauge_free(&self) -> bool {
        !self.is_mixed()
    }

    fn state_key(&self) -> StateKey {
        let db_key = self.db.state_key();
        let mut sites = vec![
            self.i_s as i64,
            i64::from(self.r_s[0]),
            i64::from(self.r_s[1]),
            i64::from(self.r_s[2]),
        ];
        sites.extend(db_key.sites);
        StateKey {
            sites,
            orientation: db_key.orientation,
        }
    }
}

impl PartialEq for SdPair {
    fn eq(&self, other: &Self) -> bool {
        self.state_key() == other.state_key()
    }
}

impl Eq for SdPair {}

impl Hash for SdPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state_key().hash(state);
    }
}

impl fmt::Display for SdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pair(solute site {}, R_s = ({}), {})",
            self.i_s,
            self.r_s.iter().join(", "),
            self.db
        )
    }
}

impl Neg for &SdPair {
    type Output = SdPair;

    fn neg(self) -> Self::Output {
        self.gauge_flipped()
    }
}

impl Neg for SdPair {
    type Output = SdPair;

    fn neg(self) -> Self::Output {
        -&self
    }
}

// ---
// Add
// ---

#[duplicate_item(
    [
        state_ [ Dumbbell ]
    ]
    [
        state_ [ SdPair ]
    ]
)]
impl Add<&'_ Jump<state_>> for &state_ {
    type Output = Result<state_, anyhow::Error>;

    fn add(self, rhs: &Jump<state_>) -> Self::Output {
        self.add_jump(rhs)
    }
}

impl Add<&'_ Jump<Dumbbell>> for &SdPair {
    type Output = Result<SdPair, anyhow::Error>;

    fn add(self, rhs: &Jump<Dumbbell>) -> Self::Output {
        self.add_dumbbell_jump(rhs)
    }
}

impl<S: DefectState> Add<&'_ Jump<S>> for &Jump<S> {
    type Output = Result<Jump<S>, anyhow::Error>;

    /// Chains two jumps. The second jump must start where the first one ends, possibly up to a
    /// gauge flip, in which case it is re-expressed in the gauge of the first.
    fn add(self, rhs: &Jump<S>) -> Self::Output {
        if self.state2 == rhs.state1 {
            Jump::new(
                self.state1.clone(),
                rhs.state2.clone(),
                self.c1,
                rhs.c2,
            )
        } else if self.state2.is_gauge_free() && self.state2.gauge_flipped() == rhs.state1 {
            let (state2, c2) = gauge_transform(&rhs.state2, rhs.c2);
            Jump::new(self.state1.clone(), state2, self.c1, c2)
        } else {
            Err(IllegalOperationError(format!(
                "jump `{rhs}` does not start where jump `{self}` ends."
            ))
            .into())
        }
    }
}

// ----
// Jump
// ----

impl<S: DefectState> PartialEq for Jump<S> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<S: DefectState> Eq for Jump<S> {}

impl<S: DefectState> Hash for Jump<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<S: DefectState> fmt::Display for Jump<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:+}] → {} [{:+}]",
            self.state1, self.c1, self.state2, self.c2
        )
    }
}

impl<S: DefectState> Neg for &Jump<S> {
    type Output = Jump<S>;

    /// Reverses the jump: the endpoints are swapped and every gauge-free endpoint is re-expressed
    /// with its orientation and indicator negated.
    fn neg(self) -> Self::Output {
        let (state1, c1) = gauge_transform(&self.state2, self.c2);
        let (state2, c2) = gauge_transform(&self.state1, self.c1);
        Jump::from_endpoints(state1, state2, c1, c2)
    }
}

impl<S: DefectState> Neg for Jump<S> {
    type Output = Jump<S>;

    fn neg(self) -> Self::Output {
        -&self
    }
}

// =========
// Functions
// =========

/// Re-expresses a jump endpoint in its opposite gauge, if it has one.
fn gauge_transform<S: DefectState>(state: &S, c: i8) -> (S, i8) {
    if state.is_gauge_free() {
        (state.gauge_flipped(), -c)
    } else {
        (state.clone(), c)
    }
}

/// Computes the Cartesian displacement between the dumbbell centres of two states.
///
/// # Arguments
///
/// * `crys` - The crystal.
/// * `chem` - The sublattice on which the states live.
/// * `state1` - The initial state.
/// * `state2` - The final state.
///
/// # Returns
///
/// The displacement from `state1` to `state2`.
pub fn disp<S: DefectState>(
    crys: &Crystal,
    chem: usize,
    state1: &S,
    state2: &S,
) -> Result<Vector3<f64>, anyhow::Error> {
    Ok(state2.position(crys, chem)? - state1.position(crys, chem)?)
}

/// Returns the Cartesian position of the moving atom at either end of a jump.
///
/// # Returns
///
/// The start and end positions of the atom that moves.
pub fn moving_atom_path<S: DefectState>(
    crys: &Crystal,
    chem: usize,
    jump: &Jump<S>,
) -> Result<(Vector3<f64>, Vector3<f64>), anyhow::Error> {
    let x1 = jump.state1.position(crys, chem)?;
    let x2 = jump.state2.position(crys, chem)?;
    let o1 = jump.state1.dumbbell().o;
    let o2 = jump.state2.dumbbell().o;
    Ok((
        x1 + o1 * (0.5 * f64::from(jump.c1)),
        x2 + o2 * (0.5 * f64::from(jump.c2)),
    ))
}
