pub mod netcdf_out;
pub mod vtk;
pub mod zarr;
