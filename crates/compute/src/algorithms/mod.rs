pub mod subspace;
