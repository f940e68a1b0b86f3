//! Tagged ciphertext handles.
//!
//! Backend ciphertexts carry neither a scale nor a packing width. Every
//! handle here records both, and the packing operations check them before
//! combining ciphertexts.

use crate::params::Scale;

/// Dense packed vector: component `i` in the constant term of ciphertext `i`
#[derive(Debug, Clone)]
pub struct EncryptedVector<C> {
    components: Vec<C>,
    scale: Scale,
    tau: usize,
}

impl<C> EncryptedVector<C> {
    pub(crate) fn new(components: Vec<C>, scale: Scale, tau: usize) -> Self {
        Self {
            components,
            scale,
            tau,
        }
    }

    /// Logical length
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn tau(&self) -> usize {
        self.tau
    }

    pub fn components(&self) -> &[C] {
        &self.components
    }
}

/// Packed matrix: one packed ciphertext per column.
///
/// Column `j` encrypts `Σ_i τ⁻¹·M[i][j]·X^(perm[i]·N/τ)`.
#[derive(Debug)]
pub struct PackedMatrix<P> {
    columns: Vec<P>,
    rows: usize,
    scale: Scale,
    tau: usize,
}

impl<P> PackedMatrix<P> {
    pub(crate) fn new(columns: Vec<P>, rows: usize, scale: Scale, tau: usize) -> Self {
        Self {
            columns,
            rows,
            scale,
            tau,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn tau(&self) -> usize {
        self.tau
    }

    pub fn columns(&self) -> &[P] {
        &self.columns
    }
}

/// Matrix-vector product spread over the `tau` strided slots
#[derive(Debug, Clone)]
pub struct PackedProduct<C> {
    ciphertext: C,
    len: usize,
    scale: Scale,
    tau: usize,
}

impl<C> PackedProduct<C> {
    pub(crate) fn new(ciphertext: C, len: usize, scale: Scale, tau: usize) -> Self {
        Self {
            ciphertext,
            len,
            scale,
            tau,
        }
    }

    /// Number of output components (rows of the matrix)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn tau(&self) -> usize {
        self.tau
    }

    pub fn ciphertext(&self) -> &C {
        &self.ciphertext
    }
}

/// One `weight · M·x` summand of `multiply_and_accumulate`
#[derive(Debug)]
pub struct PackedTerm<'a, C, P> {
    pub vector: &'a EncryptedVector<C>,
    pub matrix: &'a PackedMatrix<P>,
    pub weight: i64,
}

impl<'a, C, P> PackedTerm<'a, C, P> {
    pub fn new(vector: &'a EncryptedVector<C>, matrix: &'a PackedMatrix<P>) -> Self {
        Self {
            vector,
            matrix,
            weight: 1,
        }
    }

    pub fn weighted(
        vector: &'a EncryptedVector<C>,
        matrix: &'a PackedMatrix<P>,
        weight: i64,
    ) -> Self {
        Self {
            vector,
            matrix,
            weight,
        }
    }

    /// Scale of the product `M·x`
    pub fn scale(&self) -> Scale {
        self.vector.scale() * self.matrix.scale()
    }
}
