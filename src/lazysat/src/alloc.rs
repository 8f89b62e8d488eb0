/****************************************************************************************[alloc.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use std::cmp;
use std::fmt;
use std::marker::PhantomData;
use std::ops;

/// A growing region of `T` words, handed out in contiguous chunks.
///
/// Chunks are never given back individually: `free` only records how much
/// space became dead, and the owner decides when to compact by copying the
/// live chunks into a fresh region.
#[derive(Debug)]
pub struct RegionAllocator<T: Copy> {
    vec: Vec<T>,
    wasted: usize,
}

impl<T: Copy + Default> RegionAllocator<T> {
    pub fn new(start_cap: u32) -> Self {
        Self {
            vec: Vec::with_capacity(start_cap as usize),
            wasted: 0,
        }
    }
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.vec.len() as u32
    }
    #[inline(always)]
    pub fn wasted(&self) -> u32 {
        self.wasted as u32
    }
    pub fn alloc(&mut self, size: u32) -> Ref<T> {
        debug_assert!(size > 0);
        let r = Ref(self.vec.len() as u32, PhantomData);
        self.vec.resize(self.vec.len() + size as usize, T::default());
        r
    }
    pub fn free(&mut self, size: u32) {
        self.wasted += size as usize;
    }
    #[inline(always)]
    pub fn subslice(&self, r: Ref<T>, len: u32) -> &[T] {
        &self.vec[r.0 as usize..r.0 as usize + len as usize]
    }
    #[inline(always)]
    pub fn subslice_mut(&mut self, r: Ref<T>, len: u32) -> &mut [T] {
        &mut self.vec[r.0 as usize..r.0 as usize + len as usize]
    }
}

impl<T: Copy> ops::Index<Ref<T>> for RegionAllocator<T> {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Ref<T>) -> &Self::Output {
        &self.vec[index.0 as usize]
    }
}
impl<T: Copy> ops::IndexMut<Ref<T>> for RegionAllocator<T> {
    #[inline(always)]
    fn index_mut(&mut self, index: Ref<T>) -> &mut Self::Output {
        &mut self.vec[index.0 as usize]
    }
}

/// An offset into a `RegionAllocator<T>`.
///
/// The reference is invariant in `T`.
pub struct Ref<T: Copy>(u32, PhantomData<fn(T) -> T>);

// manual impls: deriving would require `T: Clone`/`T: PartialEq` etc.
impl<T: Copy> Clone for Ref<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: Copy> Copy for Ref<T> {}

impl<T: Copy> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.0).finish()
    }
}
impl<T: Copy> PartialEq for Ref<T> {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0
    }
}
impl<T: Copy> Eq for Ref<T> {}
impl<T: Copy> PartialOrd for Ref<T> {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(rhs))
    }
}
impl<T: Copy> Ord for Ref<T> {
    #[inline(always)]
    fn cmp(&self, rhs: &Self) -> cmp::Ordering {
        Ord::cmp(&self.0, &rhs.0)
    }
}

impl<T: Copy> Ref<T> {
    pub const UNDEF: Self = Ref(!0, PhantomData);

    /// Raw offset, so that a reference can be stored inside the region itself.
    #[inline(always)]
    pub fn to_raw(self) -> u32 {
        self.0
    }
    #[inline(always)]
    pub fn from_raw(offset: u32) -> Self {
        Ref(offset, PhantomData)
    }
}

impl<T: Copy> ops::Add<u32> for Ref<T> {
    type Output = Ref<T>;
    #[inline(always)]
    fn add(self, rhs: u32) -> Self::Output {
        Ref(self.0 + rhs, PhantomData)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_alloc_is_contiguous() {
        let mut ra: RegionAllocator<u32> = RegionAllocator::new(4);
        let a = ra.alloc(3);
        let b = ra.alloc(2);
        assert_eq!(a + 3, b);
        assert_eq!(ra.len(), 5);
        ra.subslice_mut(b, 2).copy_from_slice(&[7, 8]);
        assert_eq!(ra.subslice(b, 2), &[7, 8]);
        assert_eq!(ra[a], 0);
    }

    #[test]
    fn test_free_only_counts_waste() {
        let mut ra: RegionAllocator<u32> = RegionAllocator::new(0);
        ra.alloc(10);
        ra.free(4);
        assert_eq!(ra.len(), 10);
        assert_eq!(ra.wasted(), 4);
    }
}
