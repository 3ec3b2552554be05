//! Mushy-AMR is the numerical core of a block-structured adaptive mesh
//! refinement solver for mushy layers: binary alloys which solidify through
//! a porous region of coexisting solid and liquid. It provides the
//! phase-diagram closure mapping enthalpy and bulk concentration to
//! temperature, porosity and the phase concentrations; a nonlinear root
//! finder for ghost-zone enthalpies under Robin temperature conditions; and
//! a variable-coefficient (Darcy-Brinkman) elliptic operator with the
//! relaxation, restriction and reflux machinery needed by a composite AMR
//! multigrid solver, which is also included.
//!
//! The grid model is 2D and cell-centered. Each AMR level is a set of
//! disjoint rectangular boxes; finer levels are properly nested in coarser
//! ones. Work within a level runs in parallel across boxes, using rayon.

pub mod boundary;
pub mod coefficient;
pub mod config;
pub mod error;
pub mod flux_register;
pub mod index_space;
pub mod layout;
pub mod meshing;
pub mod multigrid;
pub mod nonlinear_bc;
pub mod operator;
pub mod patch;
pub mod permeability;
pub mod phase_diagram;
