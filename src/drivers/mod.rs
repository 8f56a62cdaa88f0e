//! # Driver Layer
//!
//! | Driver | Diretório | Conteúdo |
//! |--------|-----------|----------|
//! | Mali   | `mali/`   | GPU Mali-400/450: topologia e bring-up |

pub mod mali;
