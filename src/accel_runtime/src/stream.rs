//! Execution streams and kernel launch.
//!
//! A stream is an in-order queue: an operation issued on a stream starts only
//! after every earlier operation on the same stream has finished. The host
//! emulation runs each launch to completion before `launch_*` returns, so
//! ordering holds trivially; [`Stream::synchronize`] is still the point where
//! callers observe faults recorded by earlier launches.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{trace, warn};

use crate::device::{Device, GridLayout};
use crate::error::{Result, RuntimeError};
use crate::memory::{DeviceBuffer, ScratchBuffer};
use crate::team::Team;

/// Iteration domain of a team launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchDomain {
    pub num_groups: usize,
    pub group_size: usize,
}

impl LaunchDomain {
    pub fn new(num_groups: usize, group_size: usize) -> Self {
        Self {
            num_groups,
            group_size,
        }
    }

    /// Domain covering one grid of a grid-stride loop.
    pub fn from_grid(layout: &GridLayout) -> Self {
        Self::new(layout.num_groups, layout.group_size)
    }
}

/// In-order execution queue on one device.
#[derive(Debug)]
pub struct Stream {
    device: Device,
    launches: AtomicUsize,
    fail_at: Mutex<Option<usize>>,
    fault: Mutex<Option<RuntimeError>>,
}

impl Stream {
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.clone(),
            launches: AtomicUsize::new(0),
            fail_at: Mutex::new(None),
            fault: Mutex::new(None),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Operations issued on this stream so far.
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Make the operation with index `launch` fail (fault injection).
    pub fn fail_at(&self, launch: usize) {
        *self.fail_at.lock() = Some(launch);
    }

    /// Wait for all issued work and report the first recorded fault.
    pub fn synchronize(&self) -> Result<()> {
        match self.fault.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Check that `buffer` lives on this stream's device.
    pub fn check_buffer<T: bytemuck::Pod>(&self, buffer: &DeviceBuffer<T>) -> Result<()> {
        self.check_device(buffer.device_id())?;
        if !buffer.is_bound() {
            return Err(RuntimeError::BufferReleased);
        }
        Ok(())
    }

    /// Check that `scratch` lives on this stream's device.
    pub fn check_scratch(&self, scratch: &ScratchBuffer) -> Result<()> {
        self.check_device(scratch.device_id())
    }

    fn check_device(&self, buffer: u64) -> Result<()> {
        if buffer != self.device.id() {
            return Err(RuntimeError::DeviceMismatch {
                buffer,
                stream: self.device.id(),
            });
        }
        Ok(())
    }

    fn issue(&self, kernel: &'static str) -> Result<()> {
        let launch = self.launches.fetch_add(1, Ordering::SeqCst);
        if *self.fail_at.lock() == Some(launch) {
            let err = RuntimeError::LaunchFailed { kernel, launch };
            warn!(kernel, launch, "launch failed");
            *self.fault.lock() = Some(err.clone());
            return Err(err);
        }
        trace!(kernel, launch, "issue");
        Ok(())
    }

    /// Launch `body` once per group of `domain`.
    ///
    /// `shared_bytes` is the group-shared memory each team may allocate; it is
    /// checked against the device before anything runs.
    pub fn launch_teams<F>(
        &self,
        kernel: &'static str,
        domain: LaunchDomain,
        shared_bytes: usize,
        body: F,
    ) -> Result<()>
    where
        F: Fn(&mut Team) + Sync,
    {
        if domain.num_groups == 0 || domain.group_size == 0 {
            return Err(RuntimeError::InvalidDomain(format!(
                "{kernel}: {} groups of {} lanes",
                domain.num_groups, domain.group_size
            )));
        }
        let available = self.device.shared_memory_bytes();
        if shared_bytes > available {
            return Err(RuntimeError::SharedMemoryExceeded {
                requested: shared_bytes,
                available,
            });
        }
        self.issue(kernel)?;

        (0..domain.num_groups).into_par_iter().for_each(|group| {
            let mut team = Team::new(group, domain.num_groups, domain.group_size, shared_bytes);
            body(&mut team);
        });
        Ok(())
    }

    /// Launch `body` once per tile; tiles run independently.
    pub fn launch_tiles<F>(&self, kernel: &'static str, num_tiles: usize, body: F) -> Result<()>
    where
        F: Fn(usize) + Sync,
    {
        if num_tiles == 0 {
            return Err(RuntimeError::InvalidDomain(format!("{kernel}: no tiles")));
        }
        self.issue(kernel)?;

        (0..num_tiles).into_par_iter().for_each(|tile| body(tile));
        Ok(())
    }

    /// Set every element of `data` to `value`.
    pub fn fill<T: Copy>(&self, kernel: &'static str, data: &mut [T], value: T) -> Result<()> {
        self.issue(kernel)?;
        data.fill(value);
        Ok(())
    }

    /// Device-to-device copy of equally sized regions.
    pub fn copy<T: Copy>(&self, kernel: &'static str, src: &[T], dst: &mut [T]) -> Result<()> {
        if src.len() != dst.len() {
            return Err(RuntimeError::InvalidDomain(format!(
                "{kernel}: copy of {} elements into {}",
                src.len(),
                dst.len()
            )));
        }
        self.issue(kernel)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}
