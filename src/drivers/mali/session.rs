//! Sessões abertas por processos de usuário.
//!
//! Cada sessão tem uma fila de notificações (entregue sem bloquear) e um
//! page directory próprio, com a página do DLBU reservada em
//! `DLBU_VIRT_ADDR`.

use super::error::{MaliError, MaliResult};
use super::pages::PageDirectory;
use crate::mm::config::{DLBU_VIRT_ADDR, PAGE_SIZE};
use crate::mm::{Allocation, ObjectHeap};
use alloc::collections::VecDeque;
use alloc::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

/// Tipos de notificação (subsistema nos 16 bits altos).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NotificationType {
    CoreShutdownInProgress = 0x0_0020,
    ApplicationQuit = 0x0_0040,
    SettingsChanged = 0x0_0080,
    PpFinished = 0x2_0010,
    GpFinished = 0x3_0010,
    GpStalled = 0x3_0020,
}

impl NotificationType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0x0_0020 => Some(Self::CoreShutdownInProgress),
            0x0_0040 => Some(Self::ApplicationQuit),
            0x0_0080 => Some(Self::SettingsChanged),
            0x2_0010 => Some(Self::PpFinished),
            0x3_0010 => Some(Self::GpFinished),
            0x3_0020 => Some(Self::GpStalled),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }
}

struct Notification {
    kind: NotificationType,
    _footprint: Allocation,
}

struct Session {
    id: SessionId,
    queue: VecDeque<Notification>,
    page_directory: PageDirectory,
    _footprint: Allocation,
}

pub struct SessionManager {
    heap: ObjectHeap,
    sessions: Vec<Session>,
    next_id: u32,
    _state: Allocation,
}

impl SessionManager {
    pub fn initialize(heap: &ObjectHeap) -> MaliResult<Self> {
        let state = heap.reserve_for::<Self>()?;
        Ok(Self {
            heap: heap.clone(),
            sessions: Vec::new(),
            next_id: 1,
            _state: state,
        })
    }

    /// Abre uma sessão. Com `dlbu_phys`, a página do DLBU já fica apontada.
    pub fn open(&mut self, dlbu_phys: Option<usize>) -> MaliResult<SessionId> {
        let footprint = self.heap.reserve_for::<Session>()?;
        let mut page_directory = PageDirectory::alloc(&self.heap)?;

        if page_directory.map(DLBU_VIRT_ADDR, PAGE_SIZE).is_err() {
            crate::kerror!("(Session) Falha ao mapear a página do DLBU");
            return Err(MaliError::AllocationFailed);
        }
        if let Some(phys) = dlbu_phys {
            page_directory.update(DLBU_VIRT_ADDR, phys)?;
        }

        let id = SessionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.sessions.push(Session {
            id,
            queue: VecDeque::new(),
            page_directory,
            _footprint: footprint,
        });
        crate::kdebug!("(Session) Sessão aberta, id=", id.0);
        Ok(id)
    }

    /// Fecha a sessão; notificações pendentes e page directory são liberados.
    pub fn close(&mut self, id: SessionId) -> MaliResult<()> {
        let index = self.index_of(id)?;
        let session = self.sessions.remove(index);
        if !session.queue.is_empty() {
            crate::kdebug!("(Session) Notificações descartadas=", session.queue.len());
        }
        crate::kdebug!("(Session) Sessão fechada, id=", id.0);
        Ok(())
    }

    /// Enfileira uma notificação para a sessão.
    pub fn post_notification(&mut self, id: SessionId, kind: NotificationType) -> MaliResult<()> {
        let index = self.index_of(id)?;
        let footprint = self.heap.reserve_for::<Notification>().map_err(|err| {
            crate::kerror!("(Session) Sem memória para notificação");
            MaliError::from(err)
        })?;
        self.sessions[index].queue.push_back(Notification {
            kind,
            _footprint: footprint,
        });
        Ok(())
    }

    /// Retira a notificação mais antiga. `None` com a fila vazia.
    pub fn wait_for_notification(&mut self, id: SessionId) -> MaliResult<Option<NotificationType>> {
        let index = self.index_of(id)?;
        Ok(self.sessions[index].queue.pop_front().map(|n| n.kind))
    }

    pub fn pending_notifications(&self, id: SessionId) -> Option<usize> {
        self.session(id).map(|s| s.queue.len())
    }

    pub fn page_directory(&self, id: SessionId) -> Option<&PageDirectory> {
        self.session(id).map(|s| &s.page_directory)
    }

    pub fn count(&self) -> u32 {
        self.sessions.len() as u32
    }

    fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn index_of(&self, id: SessionId) -> MaliResult<usize> {
        self.sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or(MaliError::Fault)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if !self.sessions.is_empty() {
            crate::kwarn!("(Session) Sessões abertas no teardown=", self.sessions.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::heap::test_heap;

    #[test]
    fn open_and_close() {
        let heap = test_heap(32 * 1024);
        let mut sessions = SessionManager::initialize(&heap).unwrap();
        let a = sessions.open(None).unwrap();
        let b = sessions.open(None).unwrap();
        assert_ne!(a, b);
        assert_eq!(sessions.count(), 2);

        sessions.close(a).unwrap();
        assert_eq!(sessions.close(a), Err(MaliError::Fault));
        assert_eq!(sessions.count(), 1);

        drop(sessions);
        assert_eq!(heap.used(), 0);
    }

    #[test]
    fn notifications_are_delivered_in_order_without_blocking() {
        let heap = test_heap(32 * 1024);
        let mut sessions = SessionManager::initialize(&heap).unwrap();
        let id = sessions.open(None).unwrap();

        assert_eq!(sessions.wait_for_notification(id), Ok(None));

        sessions.post_notification(id, NotificationType::GpFinished).unwrap();
        sessions.post_notification(id, NotificationType::ApplicationQuit).unwrap();
        assert_eq!(sessions.pending_notifications(id), Some(2));

        assert_eq!(
            sessions.wait_for_notification(id),
            Ok(Some(NotificationType::GpFinished))
        );
        assert_eq!(
            sessions.wait_for_notification(id),
            Ok(Some(NotificationType::ApplicationQuit))
        );
        assert_eq!(sessions.wait_for_notification(id), Ok(None));

        let unknown = SessionId(99);
        assert_eq!(
            sessions.post_notification(unknown, NotificationType::PpFinished),
            Err(MaliError::Fault)
        );
        assert_eq!(sessions.wait_for_notification(unknown), Err(MaliError::Fault));
    }

    #[test]
    fn pending_notifications_are_released_on_close() {
        let heap = test_heap(32 * 1024);
        let mut sessions = SessionManager::initialize(&heap).unwrap();
        let idle = heap.used();

        let id = sessions.open(None).unwrap();
        sessions.post_notification(id, NotificationType::SettingsChanged).unwrap();
        sessions.close(id).unwrap();
        assert_eq!(heap.used(), idle);
    }

    #[test]
    fn dlbu_page_is_mapped_per_session() {
        let heap = test_heap(32 * 1024);
        let mut sessions = SessionManager::initialize(&heap).unwrap();

        let plain = sessions.open(None).unwrap();
        let mapping = *sessions
            .page_directory(plain)
            .unwrap()
            .lookup(DLBU_VIRT_ADDR)
            .unwrap();
        assert_eq!(mapping.size, PAGE_SIZE);
        assert_eq!(mapping.phys, None);

        let backed = sessions.open(Some(0x4000_2000)).unwrap();
        let dir = sessions.page_directory(backed).unwrap();
        assert_eq!(dir.lookup(DLBU_VIRT_ADDR).unwrap().phys, Some(0x4000_2000));

        sessions.close(backed).unwrap();
        assert!(sessions.page_directory(backed).is_none());
    }

    #[test]
    fn raw_notification_types() {
        assert_eq!(NotificationType::from_raw(0x3_0010), Some(NotificationType::GpFinished));
        assert_eq!(NotificationType::PpFinished.raw(), 0x2_0010);
        assert_eq!(NotificationType::from_raw(0x1234), None);
    }
}
