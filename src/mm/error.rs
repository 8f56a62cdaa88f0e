//! Tipos de Erro do Subsistema de Memória
//!
//! Define erros estruturados para diagnóstico preciso de falhas no heap de
//! objetos, nos backends de memória da GPU e no validador de faixas físicas.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Heap de objetos sem espaço (OOM)
    OutOfMemory,
    /// Endereço ou tamanho não alinhado a página
    NotAligned,
    /// Tamanho inválido (zero ou overflow)
    InvalidSize,
    /// Faixa de validação já registrada
    AlreadyMapped,
    /// Faixa fora da região validada
    OutOfBounds,
    /// Parâmetro inválido
    InvalidParameter,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: heap de objetos esgotado",
            Self::NotAligned => "Endereço/tamanho não alinhado a página",
            Self::InvalidSize => "Tamanho inválido",
            Self::AlreadyMapped => "Faixa de validação já registrada",
            Self::OutOfBounds => "Faixa fora da região validada",
            Self::InvalidParameter => "Parâmetro inválido",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
