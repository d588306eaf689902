use crate::types::GpuIndexList;
use crate::N_MAX_STORED_DECALS;

/// Decal indices with the straddling ones first. Both halves keep their original
/// relative order; cluster bit `p` refers to `indices[p]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexPartition {
    pub indices: Vec<u32>,
    pub num_straddling: usize,
}

impl IndexPartition {
    pub fn build(straddling: &[bool]) -> Self {
        let mut partition = Self::default();
        partition.rebuild(straddling);
        partition
    }

    /// Two stable passes over the flags, reusing the existing allocation.
    pub fn rebuild(&mut self, straddling: &[bool]) {
        self.indices.clear();
        self.indices.reserve(straddling.len());
        self.indices.extend(
            straddling.iter().enumerate().filter(|(_, s)| **s).map(|(i, _)| i as u32),
        );
        self.num_straddling = self.indices.len();
        self.indices.extend(
            straddling.iter().enumerate().filter(|(_, s)| !**s).map(|(i, _)| i as u32),
        );
    }

    pub fn active_count(&self) -> usize {
        self.indices.len()
    }

    pub fn to_gpu(&self) -> GpuIndexList {
        debug_assert!(self.indices.len() <= N_MAX_STORED_DECALS);
        let mut indices = [0u32; N_MAX_STORED_DECALS];
        indices[..self.indices.len()].copy_from_slice(&self.indices);
        GpuIndexList {
            indices,
            num_straddling: self.num_straddling as u32,
            active_count: self.indices.len() as u32,
            _padding: [0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straddling_first_in_stable_order() {
        let flags = [false, true, false, true, true, false];
        let partition = IndexPartition::build(&flags);
        assert_eq!(partition.indices, vec![1, 3, 4, 0, 2, 5]);
        assert_eq!(partition.num_straddling, 3);
    }

    #[test]
    fn test_partition_is_a_bijection() {
        for pattern in 0u32..256 {
            let flags: Vec<bool> = (0..8).map(|bit| pattern & (1 << bit) != 0).collect();
            let partition = IndexPartition::build(&flags);

            let mut sorted = partition.indices.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..8).collect::<Vec<u32>>());
            assert_eq!(partition.num_straddling, pattern.count_ones() as usize);

            let (head, tail) = partition.indices.split_at(partition.num_straddling);
            assert!(head.iter().all(|&i| flags[i as usize]));
            assert!(tail.iter().all(|&i| !flags[i as usize]));
            assert!(head.windows(2).all(|w| w[0] < w[1]));
            assert!(tail.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_empty_and_rebuild() {
        let mut partition = IndexPartition::build(&[]);
        assert_eq!(partition.active_count(), 0);
        assert_eq!(partition.num_straddling, 0);
        partition.rebuild(&[true, false]);
        assert_eq!(partition.indices, vec![0, 1]);
        partition.rebuild(&[false]);
        assert_eq!(partition.indices, vec![0]);
        assert_eq!(partition.num_straddling, 0);
    }

    #[test]
    fn test_gpu_list_carries_split() {
        let gpu = IndexPartition::build(&[false, true]).to_gpu();
        assert_eq!(&gpu.indices[..2], &[1, 0]);
        assert_eq!(gpu.num_straddling, 1);
        assert_eq!(gpu.active_count, 2);
    }
}
