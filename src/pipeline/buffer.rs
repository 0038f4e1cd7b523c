use std::ops::{Index, IndexMut};

/// Fixed size 2D storage, used for render targets, depth buffers and (as a single row) for
/// vertex and index buffers.
/// Elements are stored row-major, (0, 0) is the top left element. Size never changes after
/// construction, out of range access panics.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T> {
    width: usize,
    height: usize,
    data: Vec<T>, // Storing flat array.
}

impl<T: Clone> Buffer<T> {
    /// Buffer of width * height copies of value.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        return Self {
            width,
            height,
            data: vec![value; width * height],
        };
    }

    /// Sets every element to value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Clone + Default> Buffer<T> {
    pub fn new(width: usize, height: usize) -> Self {
        return Self::filled(width, height, T::default());
    }
}

impl<T> Buffer<T> {
    /// One dimensional buffer, holding elements as a single row.
    pub fn from_elements(data: Vec<T>) -> Self {
        return Self {
            width: data.len(),
            height: 1,
            data,
        };
    }

    pub fn width(&self) -> usize {
        return self.width;
    }

    pub fn height(&self) -> usize {
        return self.height;
    }

    pub fn get_number_of_elements(&self) -> usize {
        return self.data.len();
    }

    pub fn same_dimensions<U>(&self, other: &Buffer<U>) -> bool {
        return self.width == other.width && self.height == other.height;
    }

    /// Mutable access by linear index.
    pub fn item(&mut self, index: usize) -> &mut T {
        return &mut self.data[index];
    }

    /// Mutable access by (x, y) coordinate.
    pub fn item_at(&mut self, x: usize, y: usize) -> &mut T {
        let index = self.linear_index(x, y);
        return &mut self.data[index];
    }

    pub fn get_at(&self, x: usize, y: usize) -> &T {
        return &self.data[self.linear_index(x, y)];
    }

    pub fn as_slice(&self) -> &[T] {
        return &self.data[..];
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        return self.data.iter();
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        return self.data.iter_mut();
    }

    fn linear_index(&self, x: usize, y: usize) -> usize {
        // x has to be checked separately, otherwise overflow silently lands on the next row.
        assert!(
            x < self.width && y < self.height,
            "coordinate ({}, {}) is out of a {}x{} buffer",
            x,
            y,
            self.width,
            self.height
        );
        return y * self.width + x;
    }
}

impl<T> Index<usize> for Buffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        return &self.data[index];
    }
}

impl<T> IndexMut<usize> for Buffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        return &mut self.data[index];
    }
}
