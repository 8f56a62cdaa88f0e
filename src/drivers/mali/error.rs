//! Tipos de Erro do Núcleo Mali
//!
//! Taxonomia única de falhas de bring-up/teardown. Erros do `mm` são
//! convertidos via `From`, então `?` funciona entre as camadas.

use crate::mm::MmError;

/// Erros do núcleo Mali
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaliError {
    /// Recurso ausente (esperado para recursos opcionais)
    ResourceNotFound,
    /// Heap de objetos esgotado
    AllocationFailed,
    /// Falha ao criar a MMU de um grupo
    MmuCreateFailed,
    /// Falha ao criar um core (GP, PP, DLBU, broadcast)
    CoreCreateFailed,
    /// Variante de hardware desconhecida ou recurso obrigatório ausente
    ConfigurationInvalid,
    /// Profiling indisponível (não fatal)
    ProfilingUnavailable,
    /// Recusa genérica do hardware ou do host
    Fault,
    /// Faixa de memória inválida
    InvalidRange,
    /// Subsistema já inicializado
    AlreadyInitialized,
    /// Subsistema não inicializado
    NotInitialized,
}

impl MaliError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "Recurso não encontrado",
            Self::AllocationFailed => "Falha de alocação (OOM)",
            Self::MmuCreateFailed => "Falha ao criar MMU",
            Self::CoreCreateFailed => "Falha ao criar core",
            Self::ConfigurationInvalid => "Configuração de hardware inválida",
            Self::ProfilingUnavailable => "Profiling indisponível",
            Self::Fault => "Falha de hardware/host",
            Self::InvalidRange => "Faixa de memória inválida",
            Self::AlreadyInitialized => "Subsistema já inicializado",
            Self::NotInitialized => "Subsistema não inicializado",
        }
    }
}

impl core::fmt::Display for MaliError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<MmError> for MaliError {
    fn from(err: MmError) -> Self {
        match err {
            MmError::OutOfMemory => Self::AllocationFailed,
            MmError::NotAligned
            | MmError::InvalidSize
            | MmError::AlreadyMapped
            | MmError::OutOfBounds => Self::InvalidRange,
            MmError::InvalidParameter => Self::Fault,
        }
    }
}

/// Tipo Result específico do núcleo Mali
pub type MaliResult<T> = Result<T, MaliError>;
