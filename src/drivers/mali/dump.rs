//! Dump textual do estado, limitado ao buffer do chamador.

use super::group::GroupCore;
use super::kernel_core::SubsystemContext;
use super::platform::Platform;
use core::fmt::{self, Write};

/// Escritor que trunca silenciosamente no fim do buffer.
pub struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> BoundedWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }
}

impl Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let mut n = s.len().min(room);
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        if n < s.len() {
            return Err(fmt::Error);
        }
        Ok(())
    }
}

impl<P: Platform> SubsystemContext<P> {
    /// Escreve o estado em `buf` e retorna quantos bytes foram usados.
    pub fn dump_state(&self, buf: &mut [u8]) -> usize {
        let mut w = BoundedWriter::new(buf);
        // truncar é o comportamento esperado
        let _ = self.write_state(&mut w);
        w.len()
    }

    fn write_state(&self, w: &mut BoundedWriter<'_>) -> fmt::Result {
        writeln!(
            w,
            "Mali: {} r{}p{} base=0x{:08x} init={}",
            self.get_product_id(),
            self.get_gpu_major_version(),
            self.get_gpu_minor_version(),
            self.base_address(),
            self.is_initialized()
        )?;
        writeln!(
            w,
            "grupos={} caches={} dominios={} pp={}+{}",
            self.group_count(),
            self.cache_count(),
            self.domain_count(),
            self.max_pp_cores_group_1(),
            self.max_pp_cores_group_2()
        )?;

        for (handle, group) in self.groups().iter() {
            write!(w, "  grupo {}: mmu=0x{:08x}", handle.0, group.mmu().base())?;
            match group.core() {
                Some(GroupCore::Gp(gp)) => write!(w, " gp=0x{:08x}", gp.base())?,
                Some(GroupCore::Pp(pp)) if pp.is_virtual() => {
                    write!(w, " pp-virtual=0x{:08x}", pp.base())?
                }
                Some(GroupCore::Pp(pp)) => write!(w, " pp=0x{:08x}", pp.base())?,
                None => {}
            }
            if let Some(cache) = group.cache() {
                write!(w, " l2={}", cache.0)?;
            }
            if let Some(domain) = self.domains().domain_of_group(handle) {
                write!(w, " dom={}", domain)?;
            }
            writeln!(w)?;
        }

        for cache in self.caches().iter() {
            writeln!(
                w,
                "  l2 {}: base=0x{:08x} grupos={}",
                cache.id(),
                cache.base(),
                cache.attached_groups()
            )?;
        }

        for domain in self.domains().iter() {
            writeln!(
                w,
                "  {} (id {}): mascara=0x{:02x} grupos={} caches={} ligado={}",
                domain.name(),
                domain.id(),
                domain.mask().bits(),
                domain.groups().len(),
                domain.caches().len(),
                domain.is_powered()
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_truncates_at_buffer_end() {
        let mut buf = [0u8; 8];
        let mut w = BoundedWriter::new(&mut buf);
        assert!(write!(w, "abc").is_ok());
        assert!(write!(w, "defghijk").is_err());
        assert!(w.is_full());
        assert_eq!(w.len(), 8);
        assert_eq!(&buf, b"abcdefgh");
    }

    #[test]
    fn writer_never_splits_a_character() {
        let mut buf = [0u8; 6];
        let mut w = BoundedWriter::new(&mut buf);
        assert!(write!(w, "dom").is_ok());
        // "ç" ocupa dois bytes e não cabe inteiro no último byte livre
        assert!(write!(w, "íçã").is_err());
        let len = w.len();
        assert_eq!(len, 5);
        assert_eq!(core::str::from_utf8(&buf[..len]), Ok("domí"));
    }
}
